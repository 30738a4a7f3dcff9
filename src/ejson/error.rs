//! Extended JSON parse error type.

use thiserror::Error;

/// Errors from parsing Extended JSON back into a document.
#[derive(Debug, Error)]
pub enum EjsonError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("top-level Extended JSON value must be an object")]
    TopLevelNotObject,
    #[error("invalid {0} wrapper")]
    InvalidWrapper(&'static str),
    #[error("{0} wrapper object has extra keys")]
    ExtraKeys(&'static str),
    #[error("integer {0} is out of range")]
    IntegerOutOfRange(u64),
}
