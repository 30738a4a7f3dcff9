//! Extended JSON v2 parser.
//!
//! The inverse of the renderer: reads a JSON value tree and folds the
//! `$`-prefixed wrapper objects back into typed values. Both relaxed and
//! canonical spellings of numbers and dates are accepted. Wrapper objects
//! with extra keys are rejected; objects whose `$`-keys are not recognized
//! pass through as plain documents (which keeps DBRef-style objects intact).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::DateTime;
use serde_json::{Map, Value as Json};

use crate::bson::{Document, Value};

use super::decimal128;
use super::error::EjsonError;

/// Parses Extended JSON text into a document.
pub fn parse_document(text: &str) -> Result<Document, EjsonError> {
    let root: Json = serde_json::from_str(text)?;
    ejson_to_document(&root)
}

/// Converts a JSON value tree into a document. The top level must be an
/// object that is not itself a type wrapper.
pub fn ejson_to_document(value: &Json) -> Result<Document, EjsonError> {
    match ejson_to_value(value)? {
        Value::Document(doc) => Ok(doc),
        _ => Err(EjsonError::TopLevelNotObject),
    }
}

/// Converts a single JSON value, folding type wrappers.
pub fn ejson_to_value(value: &Json) -> Result<Value, EjsonError> {
    match value {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Number(n) => number_to_value(n),
        Json::Array(items) => items
            .iter()
            .map(ejson_to_value)
            .collect::<Result<_, _>>()
            .map(Value::Array),
        Json::Object(map) => object_to_value(map),
    }
}

/// Native JSON numbers: integers in i32 range become `Int32`, wider
/// integers `Int64`, everything else `Double`.
fn number_to_value(n: &serde_json::Number) -> Result<Value, EjsonError> {
    if let Some(i) = n.as_i64() {
        return Ok(match i32::try_from(i) {
            Ok(v) => Value::Int32(v),
            Err(_) => Value::Int64(i),
        });
    }
    if let Some(u) = n.as_u64() {
        return Err(EjsonError::IntegerOutOfRange(u));
    }
    Ok(Value::Double(n.as_f64().unwrap_or(f64::NAN)))
}

fn object_to_value(map: &Map<String, Json>) -> Result<Value, EjsonError> {
    if map.contains_key("$oid") {
        let s = expect_str(single(map, "$oid", "ObjectId")?, "ObjectId")?;
        let id = parse_oid(s).ok_or(EjsonError::InvalidWrapper("ObjectId"))?;
        return Ok(Value::ObjectId(id));
    }
    if map.contains_key("$numberInt") {
        let s = expect_str(single(map, "$numberInt", "Int32")?, "Int32")?;
        let v = s.parse().map_err(|_| EjsonError::InvalidWrapper("Int32"))?;
        return Ok(Value::Int32(v));
    }
    if map.contains_key("$numberLong") {
        let s = expect_str(single(map, "$numberLong", "Int64")?, "Int64")?;
        let v = s.parse().map_err(|_| EjsonError::InvalidWrapper("Int64"))?;
        return Ok(Value::Int64(v));
    }
    if map.contains_key("$numberDouble") {
        let s = expect_str(single(map, "$numberDouble", "Double")?, "Double")?;
        let v = match s {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            other => other
                .parse()
                .map_err(|_| EjsonError::InvalidWrapper("Double"))?,
        };
        return Ok(Value::Double(v));
    }
    if map.contains_key("$numberDecimal") {
        let s = expect_str(single(map, "$numberDecimal", "Decimal128")?, "Decimal128")?;
        let raw = decimal128::from_string(s).ok_or(EjsonError::InvalidWrapper("Decimal128"))?;
        return Ok(Value::Decimal128(raw));
    }
    if map.contains_key("$binary") {
        let inner = expect_obj(single(map, "$binary", "Binary")?, "Binary")?;
        if inner.len() != 2 {
            return Err(EjsonError::InvalidWrapper("Binary"));
        }
        let b64 = inner
            .get("base64")
            .and_then(Json::as_str)
            .ok_or(EjsonError::InvalidWrapper("Binary"))?;
        let sub = inner
            .get("subType")
            .and_then(Json::as_str)
            .ok_or(EjsonError::InvalidWrapper("Binary"))?;
        let bytes = BASE64
            .decode(b64)
            .map_err(|_| EjsonError::InvalidWrapper("Binary"))?;
        let subtype =
            u8::from_str_radix(sub, 16).map_err(|_| EjsonError::InvalidWrapper("Binary"))?;
        return Ok(Value::Binary { subtype, bytes });
    }
    if map.contains_key("$uuid") {
        let s = expect_str(single(map, "$uuid", "UUID")?, "UUID")?;
        let bytes = parse_uuid(s).ok_or(EjsonError::InvalidWrapper("UUID"))?;
        return Ok(Value::Binary {
            subtype: 4,
            bytes: bytes.to_vec(),
        });
    }
    if map.contains_key("$date") {
        let inner = single(map, "$date", "Date")?;
        let ms = match inner {
            Json::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp_millis())
                .map_err(|_| EjsonError::InvalidWrapper("Date"))?,
            Json::Object(m) => match m.get("$numberLong").and_then(Json::as_str) {
                Some(s) if m.len() == 1 => {
                    s.parse().map_err(|_| EjsonError::InvalidWrapper("Date"))?
                }
                _ => return Err(EjsonError::InvalidWrapper("Date")),
            },
            Json::Number(n) => n.as_i64().ok_or(EjsonError::InvalidWrapper("Date"))?,
            _ => return Err(EjsonError::InvalidWrapper("Date")),
        };
        return Ok(Value::DateTime(ms));
    }
    if map.contains_key("$regularExpression") {
        let inner = expect_obj(
            single(map, "$regularExpression", "RegularExpression")?,
            "RegularExpression",
        )?;
        if inner.len() != 2 {
            return Err(EjsonError::InvalidWrapper("RegularExpression"));
        }
        let pattern = inner
            .get("pattern")
            .and_then(Json::as_str)
            .ok_or(EjsonError::InvalidWrapper("RegularExpression"))?;
        let options = inner
            .get("options")
            .and_then(Json::as_str)
            .ok_or(EjsonError::InvalidWrapper("RegularExpression"))?;
        return Ok(Value::Regex {
            pattern: pattern.to_owned(),
            options: options.to_owned(),
        });
    }
    if map.contains_key("$timestamp") {
        let inner = expect_obj(single(map, "$timestamp", "Timestamp")?, "Timestamp")?;
        if inner.len() != 2 {
            return Err(EjsonError::InvalidWrapper("Timestamp"));
        }
        let time = timestamp_field(inner, "t")?;
        let increment = timestamp_field(inner, "i")?;
        return Ok(Value::Timestamp { time, increment });
    }
    if map.contains_key("$code") {
        return match map.len() {
            1 => {
                let code = expect_str(single(map, "$code", "Code")?, "Code")?;
                Ok(Value::Code(code.to_owned()))
            }
            2 if map.contains_key("$scope") => {
                let code = map
                    .get("$code")
                    .and_then(Json::as_str)
                    .ok_or(EjsonError::InvalidWrapper("Code"))?;
                let scope = map
                    .get("$scope")
                    .ok_or(EjsonError::InvalidWrapper("Code"))
                    .and_then(ejson_to_document)?;
                Ok(Value::CodeWithScope {
                    code: code.to_owned(),
                    scope,
                })
            }
            _ => Err(EjsonError::ExtraKeys("Code")),
        };
    }
    if map.contains_key("$symbol") {
        let s = expect_str(single(map, "$symbol", "Symbol")?, "Symbol")?;
        return Ok(Value::Symbol(s.to_owned()));
    }
    if map.contains_key("$dbPointer") {
        let inner = expect_obj(single(map, "$dbPointer", "DBPointer")?, "DBPointer")?;
        if inner.len() != 2 {
            return Err(EjsonError::InvalidWrapper("DBPointer"));
        }
        let namespace = inner
            .get("$ref")
            .and_then(Json::as_str)
            .ok_or(EjsonError::InvalidWrapper("DBPointer"))?;
        let id = match inner.get("$id").map(ejson_to_value) {
            Some(Ok(Value::ObjectId(id))) => id,
            _ => return Err(EjsonError::InvalidWrapper("DBPointer")),
        };
        return Ok(Value::DbPointer {
            namespace: namespace.to_owned(),
            id,
        });
    }
    if map.contains_key("$undefined") {
        if single(map, "$undefined", "Undefined")?.as_bool() != Some(true) {
            return Err(EjsonError::InvalidWrapper("Undefined"));
        }
        return Ok(Value::Undefined);
    }
    if map.contains_key("$minKey") {
        if single(map, "$minKey", "MinKey")?.as_i64() != Some(1) {
            return Err(EjsonError::InvalidWrapper("MinKey"));
        }
        return Ok(Value::MinKey);
    }
    if map.contains_key("$maxKey") {
        if single(map, "$maxKey", "MaxKey")?.as_i64() != Some(1) {
            return Err(EjsonError::InvalidWrapper("MaxKey"));
        }
        return Ok(Value::MaxKey);
    }
    // A plain document; convert each value in order.
    let mut doc = Document::new();
    for (key, val) in map {
        doc.push(key.clone(), ejson_to_value(val)?);
    }
    Ok(Value::Document(doc))
}

/// A type wrapper must be the only key of its object.
fn single<'a>(
    map: &'a Map<String, Json>,
    key: &str,
    kind: &'static str,
) -> Result<&'a Json, EjsonError> {
    if map.len() != 1 {
        return Err(EjsonError::ExtraKeys(kind));
    }
    map.get(key).ok_or(EjsonError::ExtraKeys(kind))
}

fn expect_str<'a>(value: &'a Json, kind: &'static str) -> Result<&'a str, EjsonError> {
    value.as_str().ok_or(EjsonError::InvalidWrapper(kind))
}

fn expect_obj<'a>(
    value: &'a Json,
    kind: &'static str,
) -> Result<&'a Map<String, Json>, EjsonError> {
    value.as_object().ok_or(EjsonError::InvalidWrapper(kind))
}

fn timestamp_field(map: &Map<String, Json>, key: &str) -> Result<u32, EjsonError> {
    map.get(key)
        .and_then(Json::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(EjsonError::InvalidWrapper("Timestamp"))
}

fn parse_oid(s: &str) -> Option<[u8; 12]> {
    if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut out = [0u8; 12];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` → 16 bytes.
fn parse_uuid(s: &str) -> Option<[u8; 16]> {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    let mut out = [0u8; 16];
    let mut i = 0;
    let mut pos = 0;
    while pos < 36 {
        if matches!(pos, 8 | 13 | 18 | 23) {
            if bytes[pos] != b'-' {
                return None;
            }
            pos += 1;
            continue;
        }
        let hi = (bytes[pos] as char).to_digit(16)?;
        let lo = (bytes[pos + 1] as char).to_digit(16)?;
        out[i] = (hi * 16 + lo) as u8;
        i += 1;
        pos += 2;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_document() {
        let doc = parse_document(r#"{"name":"Paris","population":2148000}"#).unwrap();
        assert_eq!(doc.get("name"), Some(&Value::String("Paris".into())));
        assert_eq!(doc.get("population"), Some(&Value::Int32(2_148_000)));
    }

    #[test]
    fn native_numbers_pick_the_narrowest_type() {
        let doc =
            parse_document(r#"{"small":5,"wide":3000000000,"frac":1.5}"#).unwrap();
        assert_eq!(doc.get("small"), Some(&Value::Int32(5)));
        assert_eq!(doc.get("wide"), Some(&Value::Int64(3_000_000_000)));
        assert_eq!(doc.get("frac"), Some(&Value::Double(1.5)));
    }

    #[test]
    fn parses_object_id() {
        let doc = parse_document(r#"{"_id":{"$oid":"654d1f710123456789abcdef"}}"#).unwrap();
        assert_eq!(
            doc.get("_id"),
            Some(&Value::ObjectId([
                0x65, 0x4d, 0x1f, 0x71, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
            ]))
        );
    }

    #[test]
    fn parses_both_date_spellings() {
        let relaxed = parse_document(r#"{"d":{"$date":"2024-01-01T00:00:00.000Z"}}"#).unwrap();
        let canonical =
            parse_document(r#"{"d":{"$date":{"$numberLong":"1704067200000"}}}"#).unwrap();
        assert_eq!(relaxed.get("d"), Some(&Value::DateTime(1_704_067_200_000)));
        assert_eq!(relaxed, canonical);
    }

    #[test]
    fn parses_uuid_as_binary_subtype_four() {
        let doc =
            parse_document(r#"{"u":{"$uuid":"00112233-4455-6677-8899-aabbccddeeff"}}"#).unwrap();
        assert_eq!(
            doc.get("u"),
            Some(&Value::Binary {
                subtype: 4,
                bytes: vec![
                    0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb,
                    0xcc, 0xdd, 0xee, 0xff,
                ],
            })
        );
    }

    #[test]
    fn rejects_wrapper_with_extra_keys() {
        let err =
            parse_document(r#"{"x":{"$oid":"654d1f710123456789abcdef","y":1}}"#).unwrap_err();
        assert!(matches!(err, EjsonError::ExtraKeys("ObjectId")));
    }

    #[test]
    fn rejects_decimal_with_overflowing_exponent() {
        let err =
            parse_document(r#"{"d":{"$numberDecimal":"1.5E-2147483648"}}"#).unwrap_err();
        assert!(matches!(err, EjsonError::InvalidWrapper("Decimal128")));
    }

    #[test]
    fn rejects_malformed_object_id() {
        let err = parse_document(r#"{"x":{"$oid":"nothex"}}"#).unwrap_err();
        assert!(matches!(err, EjsonError::InvalidWrapper("ObjectId")));
    }

    #[test]
    fn unrecognized_dollar_keys_stay_plain() {
        // DBRef convention: $ref/$id objects are not type wrappers.
        let doc = parse_document(
            r#"{"link":{"$ref":"coll","$id":{"$oid":"654d1f710123456789abcdef"}}}"#,
        )
        .unwrap();
        match doc.get("link") {
            Some(Value::Document(inner)) => {
                assert_eq!(inner.get("$ref"), Some(&Value::String("coll".into())));
                assert!(matches!(inner.get("$id"), Some(Value::ObjectId(_))));
            }
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[test]
    fn top_level_must_be_an_object() {
        assert!(matches!(
            parse_document("[1,2,3]").unwrap_err(),
            EjsonError::TopLevelNotObject
        ));
        assert!(matches!(
            parse_document(r#"{"$oid":"654d1f710123456789abcdef"}"#).unwrap_err(),
            EjsonError::TopLevelNotObject
        ));
    }

    #[test]
    fn rejects_invalid_json_text() {
        assert!(matches!(
            parse_document("{not json").unwrap_err(),
            EjsonError::Json(_)
        ));
    }
}
