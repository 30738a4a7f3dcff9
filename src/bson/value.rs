//! BSON value and document types.

/// A single BSON element value.
///
/// Variants map one-to-one onto the element types of the BSON 1.1 spec; the
/// wire type tag of each variant is noted inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit IEEE 754 double (0x01).
    Double(f64),
    /// UTF-8 string (0x02).
    String(String),
    /// Embedded document (0x03).
    Document(Document),
    /// Array (0x04), stored on the wire as a document with decimal keys.
    Array(Vec<Value>),
    /// Binary blob with a subtype tag (0x05).
    Binary { subtype: u8, bytes: Vec<u8> },
    /// Undefined (0x06, deprecated).
    Undefined,
    /// ObjectId, 12 raw bytes (0x07).
    ObjectId([u8; 12]),
    /// Boolean (0x08).
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch (0x09).
    DateTime(i64),
    /// Null (0x0A).
    Null,
    /// Regular expression (0x0B).
    Regex { pattern: String, options: String },
    /// DBPointer (0x0C, deprecated).
    DbPointer { namespace: String, id: [u8; 12] },
    /// JavaScript code (0x0D).
    Code(String),
    /// Symbol (0x0E, deprecated).
    Symbol(String),
    /// JavaScript code with scope (0x0F, deprecated).
    CodeWithScope { code: String, scope: Document },
    /// 32-bit integer (0x10).
    Int32(i32),
    /// MongoDB internal replication timestamp (0x11).
    Timestamp { time: u32, increment: u32 },
    /// 64-bit integer (0x12).
    Int64(i64),
    /// IEEE 754-2008 decimal128, 16 raw bytes in little-endian BID (0x13).
    Decimal128([u8; 16]),
    /// Min key sentinel (0xFF).
    MinKey,
    /// Max key sentinel (0x7F).
    MaxKey,
}

/// An ordered mapping from string keys to BSON values.
///
/// BSON documents are ordered on the wire; insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document(Vec<(String, Value)>);

impl Document {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a field. Keys are not deduplicated; the wire format itself
    /// does not forbid duplicates.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.0.push((key.into(), value));
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
