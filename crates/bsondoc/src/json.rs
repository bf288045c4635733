//! Extended JSON (v2) view of documents and values.
//!
//! Type information JSON cannot carry is kept in `$`-prefixed wrapper
//! objects (`{"$oid": "..."}`, `{"$binary": {...}}`, ...). In relaxed mode
//! (the default) int32, int64 and finite doubles become plain JSON numbers;
//! canonical mode wraps every number.

use base64::Engine;
use serde_json::{json, Map, Value};

use crate::document::Document;
use crate::value::BsonValue;

/// Options for the Extended JSON view.
#[derive(Debug, Clone, Default)]
pub struct JsonOptions {
    /// Wrap every number in `$numberInt` / `$numberLong` / `$numberDouble`.
    pub canonical: bool,
}

impl JsonOptions {
    pub fn canonical() -> Self {
        Self { canonical: true }
    }
}

impl Document {
    /// Renders the document as a JSON object, keys in storage order.
    ///
    /// For duplicate keys the first occurrence wins, matching
    /// [`Document::get`]. Iteration stops at the first element that cannot
    /// be read.
    pub fn to_json(&self, options: &JsonOptions) -> Value {
        let mut object = Map::new();
        for (key, value) in self.iter().map_while(Result::ok) {
            object.entry(key).or_insert_with(|| value.to_json(options));
        }
        Value::Object(object)
    }

    /// Renders the document's values as a JSON array, ignoring keys.
    pub fn to_json_array(&self, options: &JsonOptions) -> Value {
        Value::Array(
            self.iter()
                .map_while(Result::ok)
                .map(|(_, value)| value.to_json(options))
                .collect(),
        )
    }
}

impl BsonValue {
    pub fn to_json(&self, options: &JsonOptions) -> Value {
        match self {
            BsonValue::Double(n) => double_to_json(*n, options.canonical),
            BsonValue::String(s) => Value::String(s.clone()),
            BsonValue::Document(doc) => doc.to_json(options),
            BsonValue::Array(doc) => doc.to_json_array(options),
            BsonValue::Binary(bin) => json!({
                "$binary": {
                    "base64": base64::engine::general_purpose::STANDARD.encode(&bin.data),
                    "subType": format!("{:02x}", bin.subtype),
                }
            }),
            BsonValue::ObjectId(id) => json!({ "$oid": id.to_hex() }),
            BsonValue::Boolean(b) => Value::Bool(*b),
            BsonValue::DateTime(ms) => json!({ "$date": { "$numberLong": ms.to_string() } }),
            BsonValue::Null => Value::Null,
            BsonValue::Regex(regex) => json!({
                "$regularExpression": {
                    "pattern": regex.pattern,
                    "options": regex.options,
                }
            }),
            BsonValue::JavaScriptCode(code) => json!({ "$code": code }),
            BsonValue::JavaScriptCodeWithScope(code) => json!({
                "$code": code.code,
                "$scope": code.scope.to_json(options),
            }),
            BsonValue::Int32(n) if options.canonical => json!({ "$numberInt": n.to_string() }),
            BsonValue::Int32(n) => json!(n),
            BsonValue::Timestamp(ts) => json!({
                "$timestamp": { "t": ts.timestamp, "i": ts.increment }
            }),
            BsonValue::Int64(n) if options.canonical => json!({ "$numberLong": n.to_string() }),
            BsonValue::Int64(n) => json!(n),
            BsonValue::MinKey => json!({ "$minKey": 1 }),
            BsonValue::MaxKey => json!({ "$maxKey": 1 }),
        }
    }
}

fn double_to_json(n: f64, canonical: bool) -> Value {
    let special = if n.is_nan() {
        Some("NaN")
    } else if n == f64::INFINITY {
        Some("Infinity")
    } else if n == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    };
    match special {
        Some(name) => json!({ "$numberDouble": name }),
        None if canonical => json!({ "$numberDouble": format!("{n:?}") }),
        None => json!(n),
    }
}
