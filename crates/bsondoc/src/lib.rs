//! BSON documents that are their own wire encoding.
//!
//! A [`Document`] holds the exact bytes a BSON encoder would emit and reads
//! and writes them in place, with dictionary-style (`get`, `set`, `remove`)
//! and array-style (`push`, `get_at`) access. [`decode_documents`] and
//! [`encode_documents`] handle streams of documents laid back to back.
//!
//! ```
//! use bsondoc::{BsonValue, Document};
//!
//! let mut doc = Document::new();
//! doc.append("a", 1i32);
//! assert_eq!(doc.as_bytes(), &[12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]);
//! assert_eq!(doc.get("a"), Some(BsonValue::Int32(1)));
//! ```

mod bulk;
mod document;
mod element_type;
mod error;
#[cfg(feature = "json")]
mod json;
mod value;

pub use bulk::{decode_documents, encode_documents, write_documents_to_file, BulkDecodeOptions};
pub use document::{Document, DocumentIndex, Iter, MIN_DOCUMENT_LEN};
pub use element_type::{payload_len, ElementType};
pub use error::{DocumentError, ValidationError};
#[cfg(feature = "json")]
pub use json::JsonOptions;
pub use value::{
    Binary, BsonValue, CodeWithScope, MaxKey, MinKey, Null, ObjectId, Primitive, Regex, Timestamp,
};
