//! BSON (Binary JSON) document codec.
//!
//! BSON is a little-endian, length-prefixed binary serialization of ordered
//! documents, used among other places by MongoDB dump files. Each document
//! is a 4-byte size prefix, a sequence of typed elements with null-terminated
//! keys, and a zero terminator byte.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod value;

pub use decoder::decode_document;
pub use encoder::encode_document;
pub use error::DecodeError;
pub use value::{Document, Value};
