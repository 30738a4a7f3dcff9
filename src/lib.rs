//! `bson2json` — convert a single BSON document file to MongoDB Extended
//! JSON v2 text.
//!
//! The crate is two codecs and a thin pipeline over them:
//! - [`bson`] — decoder/encoder for the binary document format;
//! - [`ejson`] — Extended JSON rendering and the inverse parser;
//! - [`convert`] — read file → decode → render → atomic write.

pub mod bson;
pub mod convert;
pub mod ejson;

pub use convert::{convert, ConvertError, ConvertOptions};
