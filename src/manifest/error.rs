//! Error types for manifest parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading or parsing a manifest.
///
/// Any of these aborts the whole manifest read.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Manifest is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Manifest schema violation: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("Record {index} has an empty url")]
    EmptyUrl { index: usize },

    #[error("Record {url}: modified '{value}' is not 'yyyy-MM-dd HH:mm:ss Z': {source}")]
    Timestamp {
        url: String,
        value: String,
        source: chrono::ParseError,
    },
}
