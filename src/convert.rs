//! The conversion pipeline: read one BSON file, render Extended JSON, write
//! it out.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::bson::{self, DecodeError};
use crate::ejson::{self, Mode};

/// Output rendering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Wrap every typed number and date (canonical Extended JSON).
    pub canonical: bool,
    /// Pretty-print the JSON output.
    pub pretty: bool,
}

/// Error type for a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode BSON document: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Converts one BSON document file to Extended JSON text.
///
/// Reads `input` fully into memory, decodes a single document, renders it as
/// Extended JSON, and writes the text to `output` via a temporary file in the
/// destination directory followed by a rename — no output file exists if any
/// earlier step fails, and the destination is never observed half-written.
/// Returns the text so the caller can also print it.
///
/// The whole input is buffered in memory; inputs are expected to be small
/// single-document dumps.
pub fn convert(
    input: &Path,
    output: &Path,
    options: ConvertOptions,
) -> Result<String, ConvertError> {
    let bytes = fs::read(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let doc = bson::decode_document(&bytes)?;
    let mode = if options.canonical {
        Mode::Canonical
    } else {
        Mode::Relaxed
    };
    let tree = ejson::document_to_ejson(&doc, mode);
    let text = if options.pretty {
        serde_json::to_string_pretty(&tree)?
    } else {
        serde_json::to_string(&tree)?
    };
    write_atomic(output, text.as_bytes()).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(text)
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
