//! Structural well-formedness checks.

use super::{Document, MIN_DOCUMENT_LEN};
use crate::element_type::{payload_len, read_i32, ElementType};
use crate::error::ValidationError;

impl Document {
    /// Checks that the buffer is a well-formed document, recursing into
    /// embedded documents, arrays and code-with-scope scopes.
    ///
    /// This is structure only: key uniqueness and array key numbering are
    /// not checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_document(&self.storage, 0)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Validates `bytes` as exactly one document; `base` is its absolute offset,
/// used for error positions.
fn validate_document(bytes: &[u8], base: usize) -> Result<(), ValidationError> {
    if bytes.len() < MIN_DOCUMENT_LEN {
        return Err(ValidationError::TooShort { offset: base });
    }
    let declared = read_i32(bytes, 0).ok_or(ValidationError::TooShort { offset: base })?;
    if usize::try_from(declared).ok() != Some(bytes.len()) {
        return Err(ValidationError::LengthMismatch {
            offset: base,
            declared: i64::from(declared),
            actual: bytes.len(),
        });
    }
    let terminator = bytes.len() - 1;
    if bytes[terminator] != 0 {
        return Err(ValidationError::MissingTerminator {
            offset: base + terminator,
        });
    }

    let mut position = 4;
    while position < terminator {
        position = validate_element(bytes, position, terminator, base)?;
    }
    Ok(())
}

/// Validates the element at `position`, returning the offset just past it.
fn validate_element(
    bytes: &[u8],
    position: usize,
    terminator: usize,
    base: usize,
) -> Result<usize, ValidationError> {
    let offset = base + position;
    let tag = bytes[position];
    let element_type =
        ElementType::from_byte(tag).ok_or(ValidationError::UnknownElementType { offset, tag })?;

    let key_start = position + 1;
    let key_len = memchr::memchr(0, &bytes[key_start..terminator])
        .ok_or(ValidationError::UnterminatedKey { offset })?;
    std::str::from_utf8(&bytes[key_start..key_start + key_len])
        .map_err(|_| ValidationError::InvalidKey { offset })?;

    let payload_start = key_start + key_len + 1;
    let payload_offset = base + payload_start;
    let len = payload_len(element_type, &bytes[..terminator], payload_start).ok_or(
        ValidationError::Truncated {
            offset: payload_offset,
        },
    )?;
    let end = payload_start
        .checked_add(len)
        .filter(|&end| end <= terminator)
        .ok_or(ValidationError::Truncated {
            offset: payload_offset,
        })?;
    let payload = &bytes[payload_start..end];

    match element_type {
        ElementType::String | ElementType::JavaScriptCode => {
            validate_string(payload, payload_offset)?;
        }
        ElementType::Document | ElementType::Array => {
            validate_document(payload, payload_offset)?;
        }
        ElementType::Boolean if payload[0] > 1 => {
            return Err(ValidationError::InvalidBoolean {
                offset: payload_offset,
            });
        }
        ElementType::Regex => {
            let split = memchr::memchr(0, payload).unwrap_or(0);
            let valid = std::str::from_utf8(&payload[..split]).is_ok()
                && std::str::from_utf8(&payload[split + 1..len - 1]).is_ok();
            if !valid {
                return Err(ValidationError::InvalidString {
                    offset: payload_offset,
                });
            }
        }
        ElementType::JavaScriptCodeWithScope => {
            validate_code_with_scope(payload, payload_offset)?;
        }
        _ => {}
    }
    Ok(end)
}

/// A string payload: int32 length ≥ 1 covering the bytes and their NUL.
fn validate_string(payload: &[u8], offset: usize) -> Result<(), ValidationError> {
    let invalid = ValidationError::InvalidString { offset };
    let len = read_i32(payload, 0)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n >= 1 && n + 4 == payload.len())
        .ok_or(invalid.clone())?;
    if payload[3 + len] != 0 {
        return Err(invalid);
    }
    std::str::from_utf8(&payload[4..3 + len]).map_err(|_| invalid)?;
    Ok(())
}

/// `[int32 total][string][document]`, with the total covering all three.
fn validate_code_with_scope(payload: &[u8], offset: usize) -> Result<(), ValidationError> {
    let inconsistent = ValidationError::InvalidCodeWithScope { offset };
    let string_len = read_i32(payload, 4)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(inconsistent.clone())?;
    let scope_start = 8usize
        .checked_add(string_len)
        .filter(|&start| start + MIN_DOCUMENT_LEN <= payload.len())
        .ok_or(inconsistent.clone())?;
    validate_string(&payload[4..scope_start], offset + 4)?;
    let scope_len = read_i32(payload, scope_start)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(inconsistent.clone())?;
    if scope_start + scope_len != payload.len() {
        return Err(inconsistent);
    }
    validate_document(&payload[scope_start..], offset + scope_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BsonValue, CodeWithScope, Regex};

    #[test]
    fn built_documents_are_valid() {
        let mut doc = Document::new();
        doc.append("s", "text");
        doc.append("n", 1i64);
        doc.append("nested", Document::from_pairs([("b", true)]));
        doc.append(
            "re",
            Regex {
                pattern: "x".into(),
                options: "i".into(),
            },
        );
        doc.append(
            "code",
            CodeWithScope {
                code: "y".into(),
                scope: Document::from_pairs([("y", 2i32)]),
            },
        );
        assert_eq!(doc.validate(), Ok(()));
        assert!(Document::new().is_valid());
    }

    #[test]
    fn length_mismatch() {
        let mut bytes = Document::from_pairs([("a", 1i32)]).into_bytes();
        bytes.push(0);
        assert!(matches!(
            validate_document(&bytes, 0),
            Err(ValidationError::LengthMismatch { declared: 12, actual: 13, .. })
        ));
    }

    #[test]
    fn missing_terminator() {
        let bytes = [5, 0, 0, 0, 1];
        assert_eq!(
            validate_document(&bytes, 0),
            Err(ValidationError::MissingTerminator { offset: 4 })
        );
    }

    #[test]
    fn unknown_tag_is_reported_with_offset() {
        let doc = Document::from_bytes(&[
            16, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0x42, b'b', 0, 0, 0,
        ]);
        assert_eq!(
            doc.validate(),
            Err(ValidationError::UnknownElementType {
                offset: 11,
                tag: 0x42
            })
        );
    }

    #[test]
    fn string_without_nul() {
        // "s": len=2, 'h', 'i' (no NUL)
        let bytes = [13, 0, 0, 0, 0x02, b's', 0, 2, 0, 0, 0, b'h', 0];
        assert!(matches!(
            Document::from_bytes(&bytes).validate(),
            Err(ValidationError::InvalidString { .. }) | Err(ValidationError::Truncated { .. })
        ));
    }

    #[test]
    fn invalid_nested_document_is_found() {
        let mut doc = Document::new();
        doc.append("inner", BsonValue::Document(Document::from_pairs([("x", 1i32)])));
        let mut bytes = doc.into_bytes();
        // corrupt the nested element's tag
        let inner_tag = 4 + 1 + "inner".len() + 1 + 4;
        bytes[inner_tag] = 0x06;
        let doc = Document::from_bytes(&bytes);
        assert_eq!(
            doc.validate(),
            Err(ValidationError::UnknownElementType {
                offset: inner_tag,
                tag: 0x06
            })
        );
    }

    #[test]
    fn boolean_must_be_zero_or_one() {
        let bytes = [9, 0, 0, 0, 0x08, b'b', 0, 2, 0];
        assert_eq!(
            Document::from_bytes(&bytes).validate(),
            Err(ValidationError::InvalidBoolean { offset: 7 })
        );
    }
}
