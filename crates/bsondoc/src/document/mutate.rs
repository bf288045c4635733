//! Appending, replacing and removing elements.
//!
//! Every mutation keeps two things in step with the buffer: the length
//! header and the cached element positions. Positions are patched in place
//! rather than rescanned.

use tracing::trace;

use super::{element_end, Document, DocumentIndex};
use crate::value::{BsonValue, Primitive};

/// Encodes one element: `[tag][key][0x00][payload]`.
fn encode_element<V: Primitive>(key: &str, value: &V) -> Vec<u8> {
    let mut element = Vec::with_capacity(key.len() + 16);
    element.push(value.element_type().as_byte());
    element.extend_from_slice(key.as_bytes());
    element.push(0);
    value.write_payload(&mut element);
    element
}

impl Document {
    /// Appends `value` under `key`, just before the terminator.
    ///
    /// Duplicate keys are not detected; the new element is stored anyway and
    /// shows up in iteration, while [`get`](Document::get) keeps returning
    /// the first one. Keys are not checked for NUL bytes either: a key with
    /// an embedded NUL is cut short when read back and the element's payload
    /// is then misread.
    ///
    /// On a document whose position scan stopped at a corrupt element, the
    /// new element lands after the bytes the scan never reached. It is
    /// cached and found by [`get`](Document::get), but a fresh
    /// [`from_bytes`](Document::from_bytes) of the result stops at the same
    /// corrupt element and does not see it.
    pub fn append<V: Primitive>(&mut self, key: &str, value: V) {
        let element = encode_element(key, &value);
        let position = self.terminator_offset();
        self.storage.splice(position..position, element);
        self.element_positions.push(position);
        self.write_header();
    }

    /// Appends `value` keyed by the current element count (`"0"`, `"1"`,
    /// ...). Keys are assigned once and never renumbered.
    pub fn push<V: Primitive>(&mut self, value: V) {
        let key = self.element_positions.len().to_string();
        self.append(&key, value);
    }

    /// Replaces the first element named `key` in place, or appends when
    /// there is none. Returns the previous value.
    pub fn set<V: Primitive>(&mut self, key: &str, value: V) -> Option<BsonValue> {
        let Some((slot, position)) = self.locate(key) else {
            self.append(key, value);
            return None;
        };
        let Ok(end) = element_end(&self.storage, position) else {
            trace!(position, "cannot replace unmeasurable element");
            return None;
        };
        let previous = self.element_at(DocumentIndex::new(position)).map(|(_, v)| v);
        let element = encode_element(key, &value);
        let (old_len, new_len) = (end - position, element.len());
        self.storage.splice(position..end, element);
        for later in &mut self.element_positions[slot + 1..] {
            *later = *later + new_len - old_len;
        }
        self.write_header();
        previous
    }

    /// Removes the first element named `key` and returns its value.
    ///
    /// The element's bytes go even when its value does not decode; the
    /// result is then `None`, as it is for a missing key. Use
    /// [`contains_key`](Document::contains_key) to tell the two apart.
    pub fn remove(&mut self, key: &str) -> Option<BsonValue> {
        let (slot, position) = self.locate(key)?;
        let Ok(end) = element_end(&self.storage, position) else {
            trace!(position, "cannot remove unmeasurable element");
            return None;
        };
        let value = self.element_at(DocumentIndex::new(position)).map(|(_, v)| v);
        let removed = end - position;
        self.storage.drain(position..end);
        self.write_header();
        for cached in &mut self.element_positions {
            if *cached > position {
                *cached -= removed;
            }
        }
        self.element_positions.remove(slot);
        value
    }
}
