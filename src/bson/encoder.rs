//! BSON document encoder.
//!
//! The inverse of the decoder; mainly useful for producing fixtures and for
//! byte-level round-trip checks against dump files.

use super::value::{Document, Value};

/// Encodes a document to BSON bytes.
///
/// Keys and regex fields are wire-level C-strings and must not contain
/// interior NUL bytes; this is asserted in debug builds.
pub fn encode_document(doc: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    write_document(&mut out, doc);
    out
}

fn write_document(out: &mut Vec<u8>, doc: &Document) {
    let start = out.len();
    out.extend_from_slice(&[0u8; 4]); // size, backfilled below
    for (key, value) in doc {
        write_element(out, key, value);
    }
    out.push(0);
    let size = (out.len() - start) as i32;
    out[start..start + 4].copy_from_slice(&size.to_le_bytes());
}

fn write_element(out: &mut Vec<u8>, key: &str, value: &Value) {
    match value {
        Value::Double(f) => {
            out.push(0x01);
            write_cstring(out, key);
            out.extend_from_slice(&f.to_le_bytes());
        }
        Value::String(s) => {
            out.push(0x02);
            write_cstring(out, key);
            write_string(out, s);
        }
        Value::Document(doc) => {
            out.push(0x03);
            write_cstring(out, key);
            write_document(out, doc);
        }
        Value::Array(items) => {
            out.push(0x04);
            write_cstring(out, key);
            let indexed: Document = items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect();
            write_document(out, &indexed);
        }
        Value::Binary { subtype, bytes } => {
            out.push(0x05);
            write_cstring(out, key);
            if *subtype == 0x02 {
                // Old binary nests a second length prefix.
                out.extend_from_slice(&((bytes.len() as i32) + 4).to_le_bytes());
                out.push(*subtype);
                out.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
            } else {
                out.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
                out.push(*subtype);
            }
            out.extend_from_slice(bytes);
        }
        Value::Undefined => {
            out.push(0x06);
            write_cstring(out, key);
        }
        Value::ObjectId(id) => {
            out.push(0x07);
            write_cstring(out, key);
            out.extend_from_slice(id);
        }
        Value::Boolean(b) => {
            out.push(0x08);
            write_cstring(out, key);
            out.push(u8::from(*b));
        }
        Value::DateTime(ms) => {
            out.push(0x09);
            write_cstring(out, key);
            out.extend_from_slice(&ms.to_le_bytes());
        }
        Value::Null => {
            out.push(0x0a);
            write_cstring(out, key);
        }
        Value::Regex { pattern, options } => {
            out.push(0x0b);
            write_cstring(out, key);
            write_cstring(out, pattern);
            write_cstring(out, options);
        }
        Value::DbPointer { namespace, id } => {
            out.push(0x0c);
            write_cstring(out, key);
            write_string(out, namespace);
            out.extend_from_slice(id);
        }
        Value::Code(code) => {
            out.push(0x0d);
            write_cstring(out, key);
            write_string(out, code);
        }
        Value::Symbol(s) => {
            out.push(0x0e);
            write_cstring(out, key);
            write_string(out, s);
        }
        Value::CodeWithScope { code, scope } => {
            out.push(0x0f);
            write_cstring(out, key);
            let start = out.len();
            out.extend_from_slice(&[0u8; 4]); // total length, backfilled
            write_string(out, code);
            write_document(out, scope);
            let total = (out.len() - start) as i32;
            out[start..start + 4].copy_from_slice(&total.to_le_bytes());
        }
        Value::Int32(i) => {
            out.push(0x10);
            write_cstring(out, key);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Timestamp { time, increment } => {
            out.push(0x11);
            write_cstring(out, key);
            out.extend_from_slice(&increment.to_le_bytes());
            out.extend_from_slice(&time.to_le_bytes());
        }
        Value::Int64(i) => {
            out.push(0x12);
            write_cstring(out, key);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Decimal128(raw) => {
            out.push(0x13);
            write_cstring(out, key);
            out.extend_from_slice(raw);
        }
        Value::MinKey => {
            out.push(0xff);
            write_cstring(out, key);
        }
        Value::MaxKey => {
            out.push(0x7f);
            write_cstring(out, key);
        }
    }
}

/// Null-terminated C-string. An interior NUL cannot be represented; it is
/// asserted against in debug builds and truncates the string in release
/// builds.
fn write_cstring(out: &mut Vec<u8>, s: &str) {
    debug_assert!(
        !s.as_bytes().contains(&0),
        "BSON cstring contains an interior NUL byte"
    );
    for byte in s.bytes() {
        if byte == 0 {
            break;
        }
        out.push(byte);
    }
    out.push(0);
}

/// Length-prefixed string: i32 (byte count + 1), UTF-8 bytes, null byte.
fn write_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    out.extend_from_slice(&((bytes.len() as i32) + 1).to_le_bytes());
    out.extend_from_slice(bytes);
    out.push(0);
}

#[cfg(test)]
mod tests {
    use super::super::decoder::decode_document;
    use super::*;

    fn doc(fields: &[(&str, Value)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn encodes_string_field() {
        let d = doc(&[("hello", Value::String("world".into()))]);
        let bytes = encode_document(&d);
        assert_eq!(
            bytes,
            [
                0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00,
                0x00, 0x00, b'w', b'o', b'r', b'l', b'd', 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn encodes_empty_document() {
        assert_eq!(encode_document(&Document::new()), [0x05, 0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "NUL")]
    fn asserts_on_interior_nul_in_key() {
        let d = doc(&[("a\0b", Value::Null)]);
        encode_document(&d);
    }

    #[test]
    fn old_binary_round_trips_with_inner_prefix() {
        let d = doc(&[(
            "b",
            Value::Binary {
                subtype: 0x02,
                bytes: vec![0xaa, 0xbb],
            },
        )]);
        let bytes = encode_document(&d);
        assert_eq!(
            bytes,
            [
                0x13, 0x00, 0x00, 0x00, 0x05, b'b', 0x00, 0x06, 0x00, 0x00, 0x00, 0x02, 0x02,
                0x00, 0x00, 0x00, 0xaa, 0xbb, 0x00,
            ]
        );
        assert_eq!(decode_document(&bytes).unwrap(), d);
    }

    #[test]
    fn round_trips_every_element_type() {
        let d = doc(&[
            ("double", Value::Double(-123.125)),
            ("string", Value::String("asdf 😱 asdf".into())),
            (
                "nested",
                Value::Document(doc(&[("inner", Value::Boolean(true))])),
            ),
            (
                "array",
                Value::Array(vec![
                    Value::Int32(1),
                    Value::String("a".into()),
                    Value::Null,
                ]),
            ),
            (
                "binary",
                Value::Binary {
                    subtype: 0x80,
                    bytes: vec![1, 2, 3, 4, 5],
                },
            ),
            ("undefined", Value::Undefined),
            (
                "oid",
                Value::ObjectId([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]),
            ),
            ("bool", Value::Boolean(false)),
            ("date", Value::DateTime(1_704_067_200_000)),
            ("null", Value::Null),
            (
                "regex",
                Value::Regex {
                    pattern: "^a.*z$".into(),
                    options: "im".into(),
                },
            ),
            (
                "dbptr",
                Value::DbPointer {
                    namespace: "db.coll".into(),
                    id: [11; 12],
                },
            ),
            ("code", Value::Code("return 1;".into())),
            ("symbol", Value::Symbol("sym".into())),
            (
                "codews",
                Value::CodeWithScope {
                    code: "x".into(),
                    scope: doc(&[("x", Value::Int32(7))]),
                },
            ),
            ("int32", Value::Int32(i32::MIN)),
            (
                "ts",
                Value::Timestamp {
                    time: 1_700_000_000,
                    increment: 42,
                },
            ),
            ("int64", Value::Int64(i64::MAX)),
            ("dec", Value::Decimal128([0x55; 16])),
            ("min", Value::MinKey),
            ("max", Value::MaxKey),
        ]);
        let bytes = encode_document(&d);
        assert_eq!(decode_document(&bytes).unwrap(), d);
    }
}
