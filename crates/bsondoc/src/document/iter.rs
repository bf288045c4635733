//! Cursor-based traversal over a document's elements.

use std::iter::FusedIterator;

use super::{element_end, Document};
use crate::element_type::{payload_len, ElementType};
use crate::error::DocumentError;
use crate::value::BsonValue;

/// Byte offset of an element's tag inside one particular document.
///
/// An index is only meaningful for the document that produced it. Comparing
/// indices from two different documents, or using one document's index to
/// read another, gives unspecified results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentIndex(usize);

impl DocumentIndex {
    #[inline]
    pub(crate) const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Absolute byte offset into the owning document.
    #[inline]
    pub const fn offset(self) -> usize {
        self.0
    }
}

impl Document {
    /// Index of the first element (the byte after the length header).
    #[inline]
    pub fn start_index(&self) -> DocumentIndex {
        DocumentIndex(4)
    }

    /// Index of the trailing terminator.
    ///
    /// Not cached: every call walks all elements from the start, so it costs
    /// O(number of elements). Loops should iterate with [`iter`] instead of
    /// comparing against this on each step.
    ///
    /// [`iter`]: Document::iter
    pub fn end_index(&self) -> Result<DocumentIndex, DocumentError> {
        let terminator = self.terminator_offset();
        let mut index = self.start_index();
        while index.0 < terminator {
            index = self.index_after(index)?;
        }
        Ok(index)
    }

    /// Index of the element following the one at `index`.
    ///
    /// # Errors
    ///
    /// [`DocumentError::CorruptBuffer`] if the byte at `index` is not a known
    /// tag, [`DocumentError::Truncated`] if the element overruns the
    /// document. Either way the traversal cannot continue.
    pub fn index_after(&self, index: DocumentIndex) -> Result<DocumentIndex, DocumentError> {
        element_end(&self.storage, index.0).map(DocumentIndex)
    }

    /// Decodes the element at `index`.
    ///
    /// Returns `None` when the key is not UTF-8 or the payload does not
    /// decode.
    pub fn element_at(&self, index: DocumentIndex) -> Option<(String, BsonValue)> {
        let position = index.0;
        let element_type = ElementType::from_byte(*self.storage.get(position)?)?;
        let key_bytes = self.key_bytes_at(position)?;
        let key = std::str::from_utf8(key_bytes).ok()?.to_string();
        let payload_start = position + 1 + key_bytes.len() + 1;
        let len = payload_len(element_type, &self.storage, payload_start)?;
        let payload = self.storage.get(payload_start..payload_start.checked_add(len)?)?;
        let value = BsonValue::decode(element_type, payload)?;
        Some((key, value))
    }

    /// Lazily yields `(key, value)` pairs in storage order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            document: self,
            index: self.start_index(),
            done: false,
        }
    }
}

/// Iterator over a document's elements, created by [`Document::iter`].
///
/// Yields `Err` at most once: after a corrupt element it is exhausted.
/// An element whose key or value does not decode ends iteration quietly.
pub struct Iter<'a> {
    document: &'a Document,
    index: DocumentIndex,
    done: bool,
}

impl Iterator for Iter<'_> {
    type Item = Result<(String, BsonValue), DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index.0 >= self.document.terminator_offset() {
            return None;
        }
        let next = match self.document.index_after(self.index) {
            Ok(next) => next,
            Err(error) => {
                self.done = true;
                return Some(Err(error));
            }
        };
        let Some(element) = self.document.element_at(self.index) else {
            self.done = true;
            return None;
        };
        self.index = next;
        Some(Ok(element))
    }
}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Document {
    type Item = Result<(String, BsonValue), DocumentError>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
