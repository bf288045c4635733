//! The document container.
//!
//! A [`Document`] *is* its wire encoding: a little-endian int32 length, a
//! run of `[tag][key\0][payload]` elements and a trailing `0x00`. Reads and
//! writes operate directly on that buffer; there is no separate encode
//! step. Alongside the bytes the document keeps the offset of every
//! top-level element's tag byte, maintained incrementally as elements are
//! appended, replaced and removed.
//!
//! Each document exclusively owns its buffer. Mutating methods take
//! `&mut self`, and cloning copies the bytes, so no mutation is ever visible
//! through another handle.

mod iter;
mod mutate;
mod validate;

use std::fmt;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::element_type::{payload_len, read_i32, wire_len, ElementType};
use crate::error::DocumentError;
use crate::value::{BsonValue, Primitive};

pub use iter::{DocumentIndex, Iter};

/// Smallest well-formed document: the length header plus the terminator.
pub const MIN_DOCUMENT_LEN: usize = 5;

const EMPTY_DOCUMENT: [u8; MIN_DOCUMENT_LEN] = [5, 0, 0, 0, 0];

/// An ordered BSON document backed by its own byte buffer.
///
/// The length header is an int32, so a document holds at most `i32::MAX`
/// bytes.
#[derive(Clone)]
pub struct Document {
    storage: Vec<u8>,
    element_positions: Vec<usize>,
    invalid: bool,
}

impl Document {
    /// Creates an empty document (`[5, 0, 0, 0, 0]`).
    pub fn new() -> Self {
        Self {
            storage: EMPTY_DOCUMENT.to_vec(),
            element_positions: Vec::new(),
            invalid: false,
        }
    }

    /// The canonical empty document, flagged as built from malformed input.
    fn invalid_empty() -> Self {
        Self {
            invalid: true,
            ..Self::new()
        }
    }

    /// Parses a document from the front of `bytes`.
    ///
    /// Only the number of bytes named by the length header is kept, so this
    /// works on a document embedded at the start of a longer stream. Never
    /// fails: a header that cannot be read, is below 5, or exceeds
    /// `bytes.len()` yields the empty document with [`is_invalid`] set.
    ///
    /// [`is_invalid`]: Document::is_invalid
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match declared_len(bytes) {
            Some(len) => Self::from_storage(bytes[..len].to_vec()),
            None => {
                debug!(available = bytes.len(), "malformed document header");
                Self::invalid_empty()
            }
        }
    }

    /// Parses a document starting at `offset` inside `bytes`.
    pub fn from_slice(bytes: &[u8], offset: usize) -> Self {
        match bytes.get(offset..) {
            Some(rest) => Self::from_bytes(rest),
            None => {
                debug!(offset, available = bytes.len(), "document offset out of range");
                Self::invalid_empty()
            }
        }
    }

    /// Takes ownership of an in-memory buffer without copying it.
    pub fn from_vec(mut bytes: Vec<u8>) -> Self {
        match declared_len(&bytes) {
            Some(len) => {
                bytes.truncate(len);
                Self::from_storage(bytes)
            }
            None => {
                debug!(available = bytes.len(), "malformed document header");
                Self::invalid_empty()
            }
        }
    }

    /// Builds a document by appending each pair in order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Primitive,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut doc = Self::new();
        for (key, value) in pairs {
            doc.append(key.as_ref(), value);
        }
        doc
    }

    /// Builds an array-style document keyed `"0"`, `"1"`, ...
    pub fn from_values<V, I>(values: I) -> Self
    where
        V: Primitive,
        I: IntoIterator<Item = V>,
    {
        let mut doc = Self::new();
        for value in values {
            doc.push(value);
        }
        doc
    }

    fn from_storage(storage: Vec<u8>) -> Self {
        let element_positions = scan_positions(&storage);
        Self {
            storage,
            element_positions,
            invalid: false,
        }
    }

    /// The raw wire bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.storage
    }

    /// Total encoded size, equal to the length header.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.storage.len()
    }

    /// Number of top-level elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.element_positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.element_positions.is_empty()
    }

    /// `true` when this document was built from malformed input and was
    /// replaced by the empty document.
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Offsets of every top-level element's tag byte, in storage order.
    #[inline]
    pub fn element_positions(&self) -> &[usize] {
        &self.element_positions
    }

    /// Offset of the trailing `0x00`.
    #[inline]
    fn terminator_offset(&self) -> usize {
        self.storage.len() - 1
    }

    /// Key bytes of the element whose tag sits at `position`.
    fn key_bytes_at(&self, position: usize) -> Option<&[u8]> {
        let rest = self.storage.get(position + 1..)?;
        let end = memchr::memchr(0, rest)?;
        Some(&rest[..end])
    }

    /// Element position and cache slot of the first element named `key`.
    fn locate(&self, key: &str) -> Option<(usize, usize)> {
        let key = key.as_bytes();
        self.element_positions
            .iter()
            .enumerate()
            .find(|&(_, &position)| self.key_bytes_at(position) == Some(key))
            .map(|(slot, &position)| (slot, position))
    }

    /// Value of the first element named `key`, in storage order.
    ///
    /// Duplicate keys are allowed in the byte stream; later duplicates are
    /// only reachable through iteration.
    pub fn get(&self, key: &str) -> Option<BsonValue> {
        let (_, position) = self.locate(key)?;
        self.element_at(DocumentIndex::new(position))
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locate(key).is_some()
    }

    /// Key and value of the element at logical position `index`.
    pub fn get_at(&self, index: usize) -> Option<(String, BsonValue)> {
        let position = *self.element_positions.get(index)?;
        self.element_at(DocumentIndex::new(position))
    }

    /// Keys of all elements in storage order. Keys that are not UTF-8 are
    /// skipped.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.element_positions
            .iter()
            .filter_map(|&position| std::str::from_utf8(self.key_bytes_at(position)?).ok())
    }

    /// Values of all elements in storage order.
    pub fn values(&self) -> impl Iterator<Item = BsonValue> + '_ {
        self.element_positions
            .iter()
            .filter_map(|&position| self.element_at(DocumentIndex::new(position)))
            .map(|(_, value)| value)
    }

    /// Writes the raw bytes to `path` verbatim.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        std::fs::write(path, &self.storage)
    }

    /// Rewrites the length header from the current buffer size.
    fn write_header(&mut self) {
        let len = wire_len(self.storage.len());
        self.storage[..4].copy_from_slice(&len.to_le_bytes());
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal when the bytes are equal and both or neither came from malformed
/// input, so an invalid document never equals [`Document::new`].
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.invalid == other.invalid && self.storage == other.storage
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map_while(Result::ok))
            .finish()
    }
}

impl Primitive for Document {
    fn element_type(&self) -> ElementType {
        ElementType::Document
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.storage);
    }
}

/// Reads the length header, accepting it only when it is at least 5 and
/// fits inside `bytes`.
fn declared_len(bytes: &[u8]) -> Option<usize> {
    let len = usize::try_from(read_i32(bytes, 0)?).ok()?;
    (MIN_DOCUMENT_LEN..=bytes.len()).contains(&len).then_some(len)
}

/// Offset just past the element whose tag is at `position`.
///
/// `storage` must be one whole document; the element may not reach into the
/// trailing terminator.
pub(crate) fn element_end(storage: &[u8], position: usize) -> Result<usize, DocumentError> {
    let truncated = DocumentError::Truncated { offset: position };
    let tag = *storage.get(position).ok_or(truncated.clone())?;
    let element_type = ElementType::from_byte(tag).ok_or(DocumentError::CorruptBuffer {
        offset: position,
        tag,
    })?;
    let key_start = position + 1;
    let key_len = storage
        .get(key_start..)
        .and_then(|rest| memchr::memchr(0, rest))
        .ok_or(truncated.clone())?;
    let payload_start = key_start + key_len + 1;
    let len = payload_len(element_type, storage, payload_start).ok_or(truncated.clone())?;
    let end = payload_start.checked_add(len).ok_or(truncated.clone())?;
    if end > storage.len().saturating_sub(1) {
        return Err(truncated);
    }
    Ok(end)
}

/// One linear pass collecting every element start. Stops at the first
/// element that cannot be measured.
fn scan_positions(storage: &[u8]) -> Vec<usize> {
    let terminator = storage.len() - 1;
    let mut positions = Vec::new();
    let mut position = 4;
    while position < terminator {
        match element_end(storage, position) {
            Ok(next) => {
                positions.push(position);
                position = next;
            }
            Err(error) => {
                debug!(%error, "element scan stopped early");
                break;
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_five_bytes() {
        let doc = Document::new();
        assert_eq!(doc.as_bytes(), &[5, 0, 0, 0, 0]);
        assert!(doc.is_empty());
        assert!(!doc.is_invalid());
    }

    #[test]
    fn short_input_degrades_to_invalid_empty() {
        for bytes in [&[][..], &[5, 0, 0, 0][..], &[4, 0, 0, 0, 0][..]] {
            let doc = Document::from_bytes(bytes);
            assert!(doc.is_invalid());
            assert_eq!(doc.as_bytes(), &EMPTY_DOCUMENT);
        }
    }

    #[test]
    fn oversized_header_degrades_to_invalid_empty() {
        let doc = Document::from_bytes(&[6, 0, 0, 0, 0]);
        assert!(doc.is_invalid());
        assert_eq!(doc.as_bytes(), &EMPTY_DOCUMENT);
    }

    #[test]
    fn trailing_bytes_are_discarded() {
        let bytes = [12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0, 0xAB, 0xCD];
        let doc = Document::from_bytes(&bytes);
        assert_eq!(doc.as_bytes(), &bytes[..12]);
        assert_eq!(doc.element_positions(), &[4]);
    }

    #[test]
    fn from_slice_reads_at_offset() {
        let bytes = [0xEE, 0xEE, 5, 0, 0, 0, 0];
        assert_eq!(Document::from_slice(&bytes, 2), Document::new());
        assert!(Document::from_slice(&bytes, 20).is_invalid());
    }

    #[test]
    fn from_vec_truncates_in_place() {
        let doc = Document::from_vec(vec![5, 0, 0, 0, 0, 9, 9]);
        assert_eq!(doc.as_bytes(), &EMPTY_DOCUMENT);
        assert!(!doc.is_invalid());
    }

    #[test]
    fn scan_stops_at_corrupt_tag() {
        // int32 "a" = 1, then an unknown tag 0x42
        let bytes = [
            16, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0x42, b'b', 0, 0, 0,
        ];
        let doc = Document::from_bytes(&bytes);
        assert_eq!(doc.element_positions(), &[4]);
        assert!(!doc.is_invalid());
    }

    #[test]
    fn element_end_rejects_payload_reaching_terminator() {
        // string "s" claims 10 bytes
        let bytes = [12, 0, 0, 0, 0x02, b's', 0, 10, 0, 0, 0, 0];
        assert_eq!(
            element_end(&bytes, 4),
            Err(DocumentError::Truncated { offset: 4 })
        );
    }

    #[test]
    fn lookup_returns_first_duplicate() {
        let mut doc = Document::new();
        doc.append("k", 1i32);
        doc.append("k", 2i32);
        assert_eq!(doc.get("k"), Some(BsonValue::Int32(1)));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["k", "k"]);
    }

    #[test]
    fn get_at_and_values_follow_storage_order() {
        let doc = Document::from_pairs([("x", BsonValue::Int32(1)), ("y", BsonValue::Null)]);
        assert_eq!(doc.get_at(1), Some(("y".to_string(), BsonValue::Null)));
        assert_eq!(doc.get_at(2), None);
        assert_eq!(
            doc.values().collect::<Vec<_>>(),
            vec![BsonValue::Int32(1), BsonValue::Null]
        );
    }

    #[test]
    fn from_values_synthesizes_index_keys() {
        let doc = Document::from_values(["a", "b", "c"]);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["0", "1", "2"]);
    }

    #[test]
    fn equality_is_byte_equality() {
        let a = Document::from_pairs([("n", 1i32)]);
        let b = Document::from_bytes(a.as_bytes());
        assert_eq!(a, b);
        assert_ne!(a, Document::new());
    }

    #[test]
    fn invalid_document_differs_from_empty() {
        let invalid = Document::from_bytes(&[1, 2]);
        assert_eq!(invalid.as_bytes(), Document::new().as_bytes());
        assert_ne!(invalid, Document::new());
        assert_eq!(invalid, Document::from_vec(vec![3]));
    }

    #[test]
    fn debug_prints_as_map() {
        let doc = Document::from_pairs([("n", 1i32)]);
        assert_eq!(format!("{doc:?}"), r#"{"n": Int32(1)}"#);
    }
}
