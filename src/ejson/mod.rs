//! MongoDB Extended JSON v2.
//!
//! A superset of JSON that preserves BSON type information through
//! `$`-prefixed wrapper objects (e.g. `{"$oid":"..."}`,
//! `{"$numberInt":"..."}`).
//!
//! Two rendering modes are supported:
//! - **Relaxed** (default): native JSON types are used where lossless.
//! - **Canonical**: all typed numbers and dates use explicit wrappers.

pub mod decimal128;
pub mod decoder;
pub mod encoder;
pub mod error;

pub use decoder::{ejson_to_document, ejson_to_value, parse_document};
pub use encoder::{document_to_ejson, value_to_ejson, Mode};
pub use error::EjsonError;
