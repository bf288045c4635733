//! Back-to-back document streams.
//!
//! A bulk stream is documents concatenated with no separators; each one is
//! framed by its own length header.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::document::{Document, MIN_DOCUMENT_LEN};
use crate::element_type::read_i32;

/// Options for [`decode_documents`].
#[derive(Debug, Clone, Default)]
pub struct BulkDecodeOptions {
    /// Drop documents that fail [`Document::validate`], or whose header was
    /// rejected outright, instead of returning them.
    pub validate: bool,
}

impl BulkDecodeOptions {
    pub fn validating() -> Self {
        Self { validate: true }
    }
}

/// Splits a flat stream into documents.
///
/// Stops cleanly, without error, when fewer than 5 bytes remain, when a
/// declared length is not positive, or when it exceeds the remaining bytes.
pub fn decode_documents(bytes: &[u8], options: &BulkDecodeOptions) -> Vec<Document> {
    let mut documents = Vec::new();
    let mut offset = 0;
    while bytes.len() - offset >= MIN_DOCUMENT_LEN {
        let remaining = bytes.len() - offset;
        let declared = read_i32(bytes, offset).unwrap_or(0);
        let len = match usize::try_from(declared) {
            Ok(len) if len > 0 && len <= remaining => len,
            _ => {
                debug!(offset, declared, remaining, "bulk decode stopped");
                break;
            }
        };
        let document = Document::from_bytes(&bytes[offset..offset + len]);
        if options.validate {
            if document.is_invalid() {
                debug!(offset, declared, "dropping malformed document from bulk stream");
                offset += len;
                continue;
            }
            if let Err(error) = document.validate() {
                debug!(offset, %error, "dropping invalid document from bulk stream");
                offset += len;
                continue;
            }
        }
        offset += len;
        documents.push(document);
    }
    documents
}

/// Concatenates the raw bytes of each document in order.
pub fn encode_documents<'a, I>(documents: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut out = Vec::new();
    for document in documents {
        out.extend_from_slice(document.as_bytes());
    }
    out
}

/// Writes [`encode_documents`] output to `path`.
pub fn write_documents_to_file<'a, P, I>(path: P, documents: I) -> io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Document>,
{
    std::fs::write(path, encode_documents(documents))
}
