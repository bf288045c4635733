//! Path-keyed cache of element offsets inside nested BSON documents.
//!
//! Resolving `a.b.c` in a document means a linear scan at every level.
//! Callers that resolve the same paths over and over (sorting or querying
//! many documents with a shared shape) record what the first scan found in
//! an [`IndexTrieNode`] tree and ask it for [`IndexTrieNode::position`]
//! afterwards, falling back to a scan on a miss.
//!
//! The trie never holds document bytes, only offsets derived from them. It
//! has no internal locking; share it across threads behind a `Mutex` or
//! `RwLock`.

mod key;
mod node;

pub use key::{IndexKey, PathSegment};
pub use node::{IndexTrieNode, FRAMING_OVERHEAD};
