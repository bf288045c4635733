//! Error types for document traversal and structural validation.

use thiserror::Error;

/// Fault raised while stepping from one element to the next.
///
/// Once a traversal yields one of these it must be abandoned: the byte
/// offsets of every later element depend on the element that failed to
/// parse, so there is nothing trustworthy to continue from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("corrupt buffer: unrecognized element type 0x{tag:02x} at offset {offset}")]
    CorruptBuffer { offset: usize, tag: u8 },
    #[error("element at offset {offset} runs past the end of the document")]
    Truncated { offset: usize },
}

/// Structural problem found by [`Document::validate`](crate::Document::validate).
///
/// Every variant carries the absolute byte offset (within the validated
/// document) where the problem was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document at offset {offset} is shorter than the 5 byte minimum")]
    TooShort { offset: usize },
    #[error("document at offset {offset} declares {declared} bytes but spans {actual}")]
    LengthMismatch {
        offset: usize,
        declared: i64,
        actual: usize,
    },
    #[error("document ending at offset {offset} is missing its 0x00 terminator")]
    MissingTerminator { offset: usize },
    #[error("unrecognized element type 0x{tag:02x} at offset {offset}")]
    UnknownElementType { offset: usize, tag: u8 },
    #[error("element key at offset {offset} is not NUL-terminated")]
    UnterminatedKey { offset: usize },
    #[error("element key at offset {offset} is not valid UTF-8")]
    InvalidKey { offset: usize },
    #[error("element payload at offset {offset} runs past the end of the document")]
    Truncated { offset: usize },
    #[error("string payload at offset {offset} is malformed")]
    InvalidString { offset: usize },
    #[error("boolean payload at offset {offset} is neither 0x00 nor 0x01")]
    InvalidBoolean { offset: usize },
    #[error("code with scope at offset {offset} has inconsistent lengths")]
    InvalidCodeWithScope { offset: usize },
}
