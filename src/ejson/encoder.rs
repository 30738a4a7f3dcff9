//! Extended JSON v2 rendering.
//!
//! Renders a decoded document as a `serde_json::Value` tree in which BSON
//! types with no native JSON representation become `$`-prefixed wrapper
//! objects (`{"$oid": ...}`, `{"$date": ...}`, ...). Key order is preserved
//! through `serde_json`'s `preserve_order` feature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Datelike, SecondsFormat};
use serde_json::{json, Map, Value as Json};

use crate::bson::{Document, Value};

use super::decimal128;

/// Rendering mode for typed numbers and dates.
///
/// Relaxed mode uses native JSON types wherever the value survives the trip
/// losslessly; canonical mode wraps every typed number and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Relaxed,
    Canonical,
}

/// Renders a document as an Extended JSON value tree.
pub fn document_to_ejson(doc: &Document, mode: Mode) -> Json {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        map.insert(key.clone(), value_to_ejson(value, mode));
    }
    Json::Object(map)
}

/// Renders a single value as Extended JSON.
pub fn value_to_ejson(value: &Value, mode: Mode) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::String(s) => Json::String(s.clone()),
        Value::Double(f) => double_to_ejson(*f, mode),
        Value::Int32(i) => match mode {
            Mode::Relaxed => json!(*i),
            Mode::Canonical => json!({ "$numberInt": i.to_string() }),
        },
        Value::Int64(i) => match mode {
            Mode::Relaxed => json!(*i),
            Mode::Canonical => json!({ "$numberLong": i.to_string() }),
        },
        Value::Decimal128(raw) => json!({ "$numberDecimal": decimal128::to_string(raw) }),
        Value::Array(items) => {
            Json::Array(items.iter().map(|v| value_to_ejson(v, mode)).collect())
        }
        Value::Document(doc) => document_to_ejson(doc, mode),
        Value::DateTime(ms) => date_to_ejson(*ms, mode),
        Value::Binary { subtype, bytes } => json!({
            "$binary": { "base64": BASE64.encode(bytes), "subType": format!("{subtype:02x}") }
        }),
        Value::ObjectId(id) => json!({ "$oid": hex(id) }),
        Value::Regex { pattern, options } => json!({
            "$regularExpression": { "pattern": pattern, "options": options }
        }),
        Value::Timestamp { time, increment } => {
            json!({ "$timestamp": { "t": *time, "i": *increment } })
        }
        Value::Code(code) => json!({ "$code": code }),
        Value::CodeWithScope { code, scope } => {
            json!({ "$code": code, "$scope": document_to_ejson(scope, mode) })
        }
        Value::Symbol(s) => json!({ "$symbol": s }),
        Value::DbPointer { namespace, id } => json!({
            "$dbPointer": { "$ref": namespace, "$id": { "$oid": hex(id) } }
        }),
        Value::Undefined => json!({ "$undefined": true }),
        Value::MinKey => json!({ "$minKey": 1 }),
        Value::MaxKey => json!({ "$maxKey": 1 }),
    }
}

fn double_to_ejson(f: f64, mode: Mode) -> Json {
    // Non-finite doubles have no native JSON form in either mode.
    if !f.is_finite() {
        let s = if f.is_nan() {
            "NaN"
        } else if f > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        };
        return json!({ "$numberDouble": s });
    }
    match mode {
        Mode::Relaxed => json!(f),
        Mode::Canonical => json!({ "$numberDouble": format_double(f) }),
    }
}

/// Canonical `$numberDouble` payload; integral values keep a trailing `.0`.
fn format_double(f: f64) -> String {
    if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn date_to_ejson(ms: i64, mode: Mode) -> Json {
    if mode == Mode::Relaxed {
        if let Some(dt) = DateTime::from_timestamp_millis(ms) {
            if (1970..=9999).contains(&dt.year()) {
                return json!({ "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true) });
            }
        }
    }
    // Canonical mode, or a date outside the RFC 3339-friendly range.
    json!({ "$date": { "$numberLong": ms.to_string() } })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
