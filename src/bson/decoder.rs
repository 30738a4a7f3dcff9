//! BSON document decoder.
//!
//! All multi-byte integers are little-endian. The decoder is strict: the
//! stated document size must fit the input, every document must carry its
//! zero terminator, and bytes after the top-level document are rejected.

use super::error::DecodeError;
use super::value::{Document, Value};

/// Decodes a single BSON document from `data`.
///
/// The input must contain exactly one document; trailing bytes are an error,
/// which also catches concatenated multi-document dumps early.
pub fn decode_document(data: &[u8]) -> Result<Document, DecodeError> {
    let mut cursor = Cursor { data, pos: 0 };
    let doc = cursor.document()?;
    if cursor.pos != data.len() {
        return Err(DecodeError::TrailingBytes);
    }
    Ok(doc)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof(self.pos));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(raw))
    }

    fn f64(&mut self) -> Result<f64, DecodeError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(raw))
    }

    fn document(&mut self) -> Result<Document, DecodeError> {
        let start = self.pos;
        let stated = self.i32()?;
        // Minimum document: size field plus terminator.
        if stated < 5 {
            return Err(DecodeError::SizeMismatch {
                stated: stated.max(0) as usize,
                available: self.data.len() - start,
            });
        }
        let stated = stated as usize;
        if start + stated > self.data.len() {
            return Err(DecodeError::SizeMismatch {
                stated,
                available: self.data.len() - start,
            });
        }
        let end = start + stated;
        let mut doc = Document::new();
        loop {
            if self.pos >= end {
                return Err(DecodeError::MissingTerminator);
            }
            let tag = self.u8()?;
            if tag == 0 {
                break;
            }
            let key = self.cstring()?;
            let value = self.element(tag)?;
            doc.push(key, value);
        }
        // The terminator must land exactly on the stated size.
        if self.pos != end {
            return Err(DecodeError::MissingTerminator);
        }
        Ok(doc)
    }

    fn cstring(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        let nul = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::UnexpectedEof(self.data.len()))?;
        let s = std::str::from_utf8(&self.data[start..start + nul])
            .map_err(|_| DecodeError::InvalidUtf8)?
            .to_owned();
        self.pos = start + nul + 1;
        Ok(s)
    }

    /// Length-prefixed string: i32 byte count that includes the trailing nul.
    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.i32()?;
        if len < 1 {
            return Err(DecodeError::UnexpectedEof(self.pos));
        }
        let bytes = self.take(len as usize)?;
        let (body, terminator) = bytes.split_at(len as usize - 1);
        if terminator != [0] {
            return Err(DecodeError::MissingTerminator);
        }
        std::str::from_utf8(body)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }

    fn element(&mut self, tag: u8) -> Result<Value, DecodeError> {
        match tag {
            0x01 => Ok(Value::Double(self.f64()?)),
            0x02 => Ok(Value::String(self.string()?)),
            0x03 => Ok(Value::Document(self.document()?)),
            0x04 => Ok(Value::Array(self.array()?)),
            0x05 => {
                let len = self.i32()?;
                if len < 0 {
                    return Err(DecodeError::UnexpectedEof(self.pos));
                }
                let subtype = self.u8()?;
                let mut bytes = self.take(len as usize)?.to_vec();
                // Old binary (subtype 0x02) nests a second length prefix,
                // which is not part of the payload.
                if subtype == 0x02 {
                    if bytes.len() < 4 {
                        return Err(DecodeError::UnexpectedEof(self.pos));
                    }
                    let inner = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    if inner < 0 || inner as usize != bytes.len() - 4 {
                        return Err(DecodeError::SizeMismatch {
                            stated: inner.max(0) as usize,
                            available: bytes.len() - 4,
                        });
                    }
                    bytes.drain(..4);
                }
                Ok(Value::Binary { subtype, bytes })
            }
            0x06 => Ok(Value::Undefined),
            0x07 => Ok(Value::ObjectId(self.object_id()?)),
            0x08 => Ok(Value::Boolean(self.u8()? == 1)),
            0x09 => Ok(Value::DateTime(self.i64()?)),
            0x0a => Ok(Value::Null),
            0x0b => {
                let pattern = self.cstring()?;
                let options = self.cstring()?;
                Ok(Value::Regex { pattern, options })
            }
            0x0c => {
                let namespace = self.string()?;
                let id = self.object_id()?;
                Ok(Value::DbPointer { namespace, id })
            }
            0x0d => Ok(Value::Code(self.string()?)),
            0x0e => Ok(Value::Symbol(self.string()?)),
            0x0f => {
                let _total = self.i32()?;
                let code = self.string()?;
                let scope = self.document()?;
                Ok(Value::CodeWithScope { code, scope })
            }
            0x10 => Ok(Value::Int32(self.i32()?)),
            0x11 => {
                // Increment comes first on the wire.
                let increment = self.i32()? as u32;
                let time = self.i32()? as u32;
                Ok(Value::Timestamp { time, increment })
            }
            0x12 => Ok(Value::Int64(self.i64()?)),
            0x13 => {
                let mut raw = [0u8; 16];
                raw.copy_from_slice(self.take(16)?);
                Ok(Value::Decimal128(raw))
            }
            0xff => Ok(Value::MinKey),
            0x7f => Ok(Value::MaxKey),
            other => Err(DecodeError::UnsupportedType(other)),
        }
    }

    fn array(&mut self) -> Result<Vec<Value>, DecodeError> {
        let fields = self.document()?;
        // Wire keys are decimal indexes; order by numeric key.
        let mut indexed: Vec<(usize, Value)> = fields
            .into_iter()
            .map(|(k, v)| (k.parse().unwrap_or(0), v))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }

    fn object_id(&mut self) -> Result<[u8; 12], DecodeError> {
        let mut raw = [0u8; 12];
        raw.copy_from_slice(self.take(12)?);
        Ok(raw)
    }
}
