//! Wire tags and their payload length rules.
//!
//! | tag | type | payload |
//! |-----|------|---------|
//! | `0x01` | double | 8 bytes |
//! | `0x02` | string | int32 length (incl. NUL) + bytes |
//! | `0x03` | document | self-describing int32 length |
//! | `0x04` | array | same framing as document |
//! | `0x05` | binary | int32 length + subtype byte + bytes |
//! | `0x07` | object id | 12 bytes |
//! | `0x08` | boolean | 1 byte |
//! | `0x09` | UTC datetime | 8 bytes |
//! | `0x0A` | null | 0 bytes |
//! | `0x0B` | regex | two NUL-terminated strings |
//! | `0x0D` | JS code | int32 length (incl. NUL) + bytes |
//! | `0x0F` | JS code with scope | explicit int32 total length |
//! | `0x10` | int32 | 4 bytes |
//! | `0x11` | timestamp | 8 bytes |
//! | `0x12` | int64 | 8 bytes |
//! | `0xFF` / `0x7F` | min key / max key | 0 bytes |

/// Closed set of element type tags understood by this crate.
///
/// A byte outside this set where a tag is expected means the buffer is
/// corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    JavaScriptCode = 0x0D,
    JavaScriptCodeWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MinKey = 0xFF,
    MaxKey = 0x7F,
}

impl ElementType {
    /// Parses a tag byte, returning `None` for bytes outside the taxonomy.
    #[inline]
    #[must_use]
    pub fn from_byte(tag: u8) -> Option<Self> {
        Some(match tag {
            0x01 => ElementType::Double,
            0x02 => ElementType::String,
            0x03 => ElementType::Document,
            0x04 => ElementType::Array,
            0x05 => ElementType::Binary,
            0x07 => ElementType::ObjectId,
            0x08 => ElementType::Boolean,
            0x09 => ElementType::DateTime,
            0x0A => ElementType::Null,
            0x0B => ElementType::Regex,
            0x0D => ElementType::JavaScriptCode,
            0x0F => ElementType::JavaScriptCodeWithScope,
            0x10 => ElementType::Int32,
            0x11 => ElementType::Timestamp,
            0x12 => ElementType::Int64,
            0xFF => ElementType::MinKey,
            0x7F => ElementType::MaxKey,
            _ => return None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Type name, for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Double => "double",
            ElementType::String => "string",
            ElementType::Document => "document",
            ElementType::Array => "array",
            ElementType::Binary => "binary",
            ElementType::ObjectId => "objectId",
            ElementType::Boolean => "boolean",
            ElementType::DateTime => "datetime",
            ElementType::Null => "null",
            ElementType::Regex => "regex",
            ElementType::JavaScriptCode => "javascript",
            ElementType::JavaScriptCodeWithScope => "javascriptWithScope",
            ElementType::Int32 => "int32",
            ElementType::Timestamp => "timestamp",
            ElementType::Int64 => "int64",
            ElementType::MinKey => "minKey",
            ElementType::MaxKey => "maxKey",
        }
    }
}

/// Reads a little-endian int32 at `offset`.
#[inline]
pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> Option<i32> {
    let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(i32::from_le_bytes(raw))
}

/// Converts a byte count to an int32 length prefix.
///
/// The wire format caps every length at `i32::MAX` bytes. Larger counts trip
/// a debug assertion and saturate in release builds.
#[inline]
pub(crate) fn wire_len(len: usize) -> i32 {
    debug_assert!(
        i32::try_from(len).is_ok(),
        "length {len} exceeds the int32 wire limit"
    );
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// Reads a non-negative little-endian int32 length prefix at `offset`.
#[inline]
fn read_len(bytes: &[u8], offset: usize) -> Option<usize> {
    usize::try_from(read_i32(bytes, offset)?).ok()
}

/// Computes the payload length of an element whose payload starts at
/// `payload_offset`.
///
/// Returns `None` when a length prefix cannot be read or is negative. The
/// result is not checked against the buffer end; callers do that.
#[must_use]
pub fn payload_len(element_type: ElementType, bytes: &[u8], payload_offset: usize) -> Option<usize> {
    match element_type {
        ElementType::Double
        | ElementType::DateTime
        | ElementType::Timestamp
        | ElementType::Int64 => Some(8),
        ElementType::Int32 => Some(4),
        ElementType::ObjectId => Some(12),
        ElementType::Boolean => Some(1),
        ElementType::Null | ElementType::MinKey | ElementType::MaxKey => Some(0),
        ElementType::String | ElementType::JavaScriptCode => {
            read_len(bytes, payload_offset)?.checked_add(4)
        }
        // Self-describing: the int32 prefix counts itself.
        ElementType::Document | ElementType::Array | ElementType::JavaScriptCodeWithScope => {
            read_len(bytes, payload_offset)
        }
        ElementType::Binary => read_len(bytes, payload_offset)?.checked_add(5),
        ElementType::Regex => {
            let rest = bytes.get(payload_offset..)?;
            let pattern_end = memchr::memchr(0, rest)?;
            let options_end = memchr::memchr(0, &rest[pattern_end + 1..])?;
            Some(pattern_end + 1 + options_end + 1)
        }
    }
}
