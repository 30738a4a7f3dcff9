//! BSON decoder error type.

use thiserror::Error;

/// Error type for BSON decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("stated document size {stated} does not fit the input ({available} bytes available)")]
    SizeMismatch { stated: usize, available: usize },
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("invalid UTF-8 in string data")]
    InvalidUtf8,
    #[error("missing document terminator")]
    MissingTerminator,
    #[error("trailing bytes after document end")]
    TrailingBytes,
}
