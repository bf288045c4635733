//! Values stored in document elements.
//!
//! A document only needs two things from a value it stores: the wire tag
//! ([`Primitive::element_type`]) and the serialized payload
//! ([`Primitive::write_payload`]). [`BsonValue`] is the decoded form produced
//! when reading elements back.

use std::fmt;

use crate::document::Document;
use crate::element_type::{read_i32, wire_len, ElementType};

/// Anything that can be stored as the value of a document element.
pub trait Primitive {
    /// The one-byte wire tag written before the element key.
    fn element_type(&self) -> ElementType;

    /// Appends the serialized payload (everything after the key's NUL).
    fn write_payload(&self, out: &mut Vec<u8>);

    /// Serialized payload as a fresh buffer.
    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_payload(&mut out);
        out
    }
}

impl<T: Primitive + ?Sized> Primitive for &T {
    fn element_type(&self) -> ElementType {
        (**self).element_type()
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        (**self).write_payload(out);
    }
}

/// 12-byte object identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self { bytes }
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.bytes
    }

    /// Seconds since the Unix epoch, stored big-endian in the first 4 bytes.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// Lowercase 24-character hex form.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parses the 24-character hex form; `None` on any other input.
    pub fn parse_str(hex: &str) -> Option<Self> {
        if hex.len() != 24 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self { bytes })
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Binary data (subtype + raw bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

/// Regular expression: pattern and option flags, both stored as C strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    pub pattern: String,
    pub options: String,
}

/// Internal replication timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub increment: u32,
    pub timestamp: u32,
}

/// JavaScript code with a scope document.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeWithScope {
    pub code: String,
    pub scope: Document,
}

/// Null marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// Min key sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinKey;

/// Max key sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaxKey;

/// A decoded element value.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    /// double (0x01)
    Double(f64),
    /// UTF-8 string (0x02)
    String(String),
    /// Embedded document (0x03)
    Document(Document),
    /// Array, stored as a document keyed "0", "1", ... (0x04)
    Array(Document),
    /// Binary data (0x05)
    Binary(Binary),
    /// ObjectId (0x07)
    ObjectId(ObjectId),
    /// boolean (0x08)
    Boolean(bool),
    /// UTC datetime, milliseconds since epoch (0x09)
    DateTime(i64),
    /// null (0x0A)
    Null,
    /// Regular expression (0x0B)
    Regex(Regex),
    /// JavaScript code (0x0D)
    JavaScriptCode(String),
    /// JavaScript code with scope (0x0F)
    JavaScriptCodeWithScope(CodeWithScope),
    /// int32 (0x10)
    Int32(i32),
    /// Timestamp (0x11)
    Timestamp(Timestamp),
    /// int64 (0x12)
    Int64(i64),
    /// MinKey (0xFF)
    MinKey,
    /// MaxKey (0x7F)
    MaxKey,
}

impl BsonValue {
    /// Decodes a payload of the given type.
    ///
    /// `payload` must be exactly the bytes the element's length rule
    /// assigns to it. Returns `None` for truncated payloads and strings that
    /// are not UTF-8.
    pub fn decode(element_type: ElementType, payload: &[u8]) -> Option<Self> {
        Some(match element_type {
            ElementType::Double => BsonValue::Double(f64::from_le_bytes(fixed(payload)?)),
            ElementType::String => BsonValue::String(read_string(payload, 0)?.0),
            ElementType::Document => BsonValue::Document(Document::from_bytes(payload)),
            ElementType::Array => BsonValue::Array(Document::from_bytes(payload)),
            ElementType::Binary => {
                let len = usize::try_from(read_i32(payload, 0)?).ok()?;
                let subtype = *payload.get(4)?;
                let data = payload.get(5..5 + len)?.to_vec();
                BsonValue::Binary(Binary { subtype, data })
            }
            ElementType::ObjectId => BsonValue::ObjectId(ObjectId::from_bytes(fixed(payload)?)),
            ElementType::Boolean => BsonValue::Boolean(*payload.first()? != 0),
            ElementType::DateTime => BsonValue::DateTime(i64::from_le_bytes(fixed(payload)?)),
            ElementType::Null => BsonValue::Null,
            ElementType::Regex => {
                let (pattern, next) = read_cstring(payload, 0)?;
                let (options, _) = read_cstring(payload, next)?;
                BsonValue::Regex(Regex { pattern, options })
            }
            ElementType::JavaScriptCode => BsonValue::JavaScriptCode(read_string(payload, 0)?.0),
            ElementType::JavaScriptCodeWithScope => {
                let (code, scope_start) = read_string(payload, 4)?;
                let scope = Document::from_bytes(payload.get(scope_start..)?);
                BsonValue::JavaScriptCodeWithScope(CodeWithScope { code, scope })
            }
            ElementType::Int32 => BsonValue::Int32(i32::from_le_bytes(fixed(payload)?)),
            ElementType::Timestamp => {
                let raw: [u8; 8] = fixed(payload)?;
                BsonValue::Timestamp(Timestamp {
                    increment: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
                    timestamp: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
                })
            }
            ElementType::Int64 => BsonValue::Int64(i64::from_le_bytes(fixed(payload)?)),
            ElementType::MinKey => BsonValue::MinKey,
            ElementType::MaxKey => BsonValue::MaxKey,
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            BsonValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BsonValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BsonValue::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The embedded document of a `Document` or `Array` value.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            BsonValue::Document(doc) | BsonValue::Array(doc) => Some(doc),
            _ => None,
        }
    }
}

impl Primitive for BsonValue {
    fn element_type(&self) -> ElementType {
        match self {
            BsonValue::Double(_) => ElementType::Double,
            BsonValue::String(_) => ElementType::String,
            BsonValue::Document(_) => ElementType::Document,
            BsonValue::Array(_) => ElementType::Array,
            BsonValue::Binary(_) => ElementType::Binary,
            BsonValue::ObjectId(_) => ElementType::ObjectId,
            BsonValue::Boolean(_) => ElementType::Boolean,
            BsonValue::DateTime(_) => ElementType::DateTime,
            BsonValue::Null => ElementType::Null,
            BsonValue::Regex(_) => ElementType::Regex,
            BsonValue::JavaScriptCode(_) => ElementType::JavaScriptCode,
            BsonValue::JavaScriptCodeWithScope(_) => ElementType::JavaScriptCodeWithScope,
            BsonValue::Int32(_) => ElementType::Int32,
            BsonValue::Timestamp(_) => ElementType::Timestamp,
            BsonValue::Int64(_) => ElementType::Int64,
            BsonValue::MinKey => ElementType::MinKey,
            BsonValue::MaxKey => ElementType::MaxKey,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        match self {
            BsonValue::Double(n) => n.write_payload(out),
            BsonValue::String(s) | BsonValue::JavaScriptCode(s) => write_string(out, s),
            BsonValue::Document(doc) | BsonValue::Array(doc) => doc.write_payload(out),
            BsonValue::Binary(bin) => bin.write_payload(out),
            BsonValue::ObjectId(id) => id.write_payload(out),
            BsonValue::Boolean(b) => b.write_payload(out),
            BsonValue::DateTime(ms) | BsonValue::Int64(ms) => ms.write_payload(out),
            BsonValue::Null | BsonValue::MinKey | BsonValue::MaxKey => {}
            BsonValue::Regex(regex) => regex.write_payload(out),
            BsonValue::JavaScriptCodeWithScope(code) => code.write_payload(out),
            BsonValue::Int32(n) => n.write_payload(out),
            BsonValue::Timestamp(ts) => ts.write_payload(out),
        }
    }
}

impl Primitive for f64 {
    fn element_type(&self) -> ElementType {
        ElementType::Double
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Primitive for i32 {
    fn element_type(&self) -> ElementType {
        ElementType::Int32
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Primitive for i64 {
    fn element_type(&self) -> ElementType {
        ElementType::Int64
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Primitive for bool {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl Primitive for str {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        write_string(out, self);
    }
}

impl Primitive for String {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        write_string(out, self);
    }
}

impl Primitive for ObjectId {
    fn element_type(&self) -> ElementType {
        ElementType::ObjectId
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bytes);
    }
}

impl Primitive for Binary {
    fn element_type(&self) -> ElementType {
        ElementType::Binary
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&wire_len(self.data.len()).to_le_bytes());
        out.push(self.subtype);
        out.extend_from_slice(&self.data);
    }
}

impl Primitive for Regex {
    fn element_type(&self) -> ElementType {
        ElementType::Regex
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        write_cstring(out, &self.pattern);
        write_cstring(out, &self.options);
    }
}

impl Primitive for Timestamp {
    fn element_type(&self) -> ElementType {
        ElementType::Timestamp
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.increment.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
    }
}

impl Primitive for CodeWithScope {
    fn element_type(&self) -> ElementType {
        ElementType::JavaScriptCodeWithScope
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        let len_start = out.len();
        out.extend_from_slice(&[0u8; 4]);
        write_string(out, &self.code);
        out.extend_from_slice(self.scope.as_bytes());
        let total_len = wire_len(out.len() - len_start);
        out[len_start..len_start + 4].copy_from_slice(&total_len.to_le_bytes());
    }
}

impl Primitive for Null {
    fn element_type(&self) -> ElementType {
        ElementType::Null
    }

    fn write_payload(&self, _out: &mut Vec<u8>) {}
}

impl Primitive for MinKey {
    fn element_type(&self) -> ElementType {
        ElementType::MinKey
    }

    fn write_payload(&self, _out: &mut Vec<u8>) {}
}

impl Primitive for MaxKey {
    fn element_type(&self) -> ElementType {
        ElementType::MaxKey
    }

    fn write_payload(&self, _out: &mut Vec<u8>) {}
}

impl From<f64> for BsonValue {
    fn from(value: f64) -> Self {
        BsonValue::Double(value)
    }
}

impl From<i32> for BsonValue {
    fn from(value: i32) -> Self {
        BsonValue::Int32(value)
    }
}

impl From<i64> for BsonValue {
    fn from(value: i64) -> Self {
        BsonValue::Int64(value)
    }
}

impl From<bool> for BsonValue {
    fn from(value: bool) -> Self {
        BsonValue::Boolean(value)
    }
}

impl From<&str> for BsonValue {
    fn from(value: &str) -> Self {
        BsonValue::String(value.to_string())
    }
}

impl From<String> for BsonValue {
    fn from(value: String) -> Self {
        BsonValue::String(value)
    }
}

impl From<Document> for BsonValue {
    fn from(value: Document) -> Self {
        BsonValue::Document(value)
    }
}

impl From<ObjectId> for BsonValue {
    fn from(value: ObjectId) -> Self {
        BsonValue::ObjectId(value)
    }
}

impl From<Binary> for BsonValue {
    fn from(value: Binary) -> Self {
        BsonValue::Binary(value)
    }
}

/// Writes a string payload: int32 (byte count + 1), UTF-8 bytes, NUL.
fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    out.extend_from_slice(&wire_len(bytes.len() + 1).to_le_bytes());
    out.extend_from_slice(bytes);
    out.push(0);
}

/// Writes a C string. Stops at any NUL inside `s`.
fn write_cstring(out: &mut Vec<u8>, s: &str) {
    out.extend(s.bytes().take_while(|&b| b != 0));
    out.push(0);
}

fn fixed<const N: usize>(payload: &[u8]) -> Option<[u8; N]> {
    payload.get(..N)?.try_into().ok()
}

/// Reads a length-prefixed string at `offset`, returning it and the offset
/// just past its NUL.
fn read_string(payload: &[u8], offset: usize) -> Option<(String, usize)> {
    let len = usize::try_from(read_i32(payload, offset)?).ok()?;
    let start = offset + 4;
    let bytes = payload.get(start..start + len.checked_sub(1)?)?;
    let s = std::str::from_utf8(bytes).ok()?.to_string();
    Some((s, start + len))
}

/// Reads a NUL-terminated string at `offset`, returning it and the offset
/// just past its NUL.
fn read_cstring(payload: &[u8], offset: usize) -> Option<(String, usize)> {
    let rest = payload.get(offset..)?;
    let end = memchr::memchr(0, rest)?;
    let s = std::str::from_utf8(&rest[..end]).ok()?.to_string();
    Some((s, offset + end + 1))
}
