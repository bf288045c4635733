use std::collections::HashMap;

use tracing::trace;

use crate::key::{IndexKey, PathSegment};

/// Fixed bytes between a sub-document element's tag and the first element
/// inside it, not counting the key text: 1 tag byte, 1 key NUL and the
/// 4-byte length header.
pub const FRAMING_OVERHEAD: usize = 6;

/// Node of the position-indexing trie.
///
/// The root node stands for the outer document and its own value is unused.
/// A depth-1 node's value is the absolute offset of its element's tag in
/// the outer document. Deeper values are relative to the first byte after
/// the parent sub-document's length header.
#[derive(Debug, Clone, Default)]
pub struct IndexTrieNode {
    value: usize,
    fully_indexed: bool,
    children: HashMap<IndexKey, IndexTrieNode>,
}

impl IndexTrieNode {
    pub fn new(value: usize) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    #[inline]
    pub fn value(&self) -> usize {
        self.value
    }

    pub fn set_value(&mut self, value: usize) {
        self.value = value;
    }

    /// Whether every element below this node has already been recorded, so
    /// a miss can be trusted without rescanning the bytes.
    #[inline]
    pub fn is_fully_indexed(&self) -> bool {
        self.fully_indexed
    }

    pub fn set_fully_indexed(&mut self, fully_indexed: bool) {
        self.fully_indexed = fully_indexed;
    }

    pub fn child<K: PathSegment + ?Sized>(&self, key: &K) -> Option<&Self> {
        self.children.get(&*key.index_key())
    }

    pub fn child_mut<K: PathSegment + ?Sized>(&mut self, key: &K) -> Option<&mut Self> {
        self.children.get_mut(&*key.index_key())
    }

    pub fn children(&self) -> impl Iterator<Item = (&IndexKey, &Self)> {
        self.children.iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attaches `node` under `key`, returning the subtree it replaced.
    pub fn insert_child(&mut self, key: impl Into<IndexKey>, node: Self) -> Option<Self> {
        self.children.insert(key.into(), node)
    }

    pub fn remove_child<K: PathSegment + ?Sized>(&mut self, key: &K) -> Option<Self> {
        self.children.remove(&*key.index_key())
    }

    /// Node at `path` below this one. An empty path is this node.
    pub fn node<S: PathSegment>(&self, path: &[S]) -> Option<&Self> {
        let mut node = self;
        for segment in path {
            node = node.child(segment)?;
        }
        Some(node)
    }

    pub fn node_mut<S: PathSegment>(&mut self, path: &[S]) -> Option<&mut Self> {
        let mut node = self;
        for segment in path {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Writes or deletes the node at `path`.
    ///
    /// Only the last segment may be new: every node before it must already
    /// exist, otherwise nothing changes and `false` is returned. `Some`
    /// attaches the node, replacing any subtree already there. `None`
    /// detaches the terminal node; ancestors left without children stay in
    /// place. An empty path is a no-op.
    pub fn set_node<S: PathSegment>(&mut self, path: &[S], node: Option<Self>) -> bool {
        let Some((last, parents)) = path.split_last() else {
            trace!("set_node called with an empty path");
            return false;
        };
        let Some(parent) = self.node_mut(parents) else {
            trace!(depth = path.len(), "set_node skipped: missing intermediate node");
            return false;
        };
        match node {
            Some(node) => {
                parent.insert_child(last.index_key().into_owned(), node);
                true
            }
            None => parent.remove_child(last).is_some(),
        }
    }

    /// Shorthand for `set_node(path, Some(IndexTrieNode::new(value)))`.
    pub fn insert<S: PathSegment>(&mut self, path: &[S], value: usize) -> bool {
        self.set_node(path, Some(Self::new(value)))
    }

    /// Shorthand for `set_node(path, None)`.
    pub fn remove<S: PathSegment>(&mut self, path: &[S]) -> bool {
        self.set_node(path, None)
    }

    /// Absolute byte offset, within the outer document, of the element
    /// reached by `path`.
    ///
    /// Each step after the first adds the child's value plus
    /// [`FRAMING_OVERHEAD`] plus the byte length of the previous segment's
    /// key. `None` when any segment is missing (or the path is empty); the
    /// caller then scans the document and records what it finds.
    pub fn position<S: PathSegment>(&self, path: &[S]) -> Option<usize> {
        let (first, rest) = path.split_first()?;
        let first = first.index_key();
        let mut node = self.children.get(&*first)?;
        let mut position = node.value;
        let mut previous_len = first.byte_len();
        for segment in rest {
            let key = segment.index_key();
            node = node.children.get(&*key)?;
            position += node.value + FRAMING_OVERHEAD + previous_len;
            previous_len = key.byte_len();
        }
        Some(position)
    }
}
