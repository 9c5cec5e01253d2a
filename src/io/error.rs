use std::path::PathBuf;

use crate::io::lock::LockError;

/// Error type shared by the note, cache and preference stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line} is out of range in {filename}")]
    LineOutOfRange { filename: String, line: usize },
    #[error("could not encode cache document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not parse preferences: {0}")]
    Prefs(#[from] toml_edit::TomlError),
    #[error(transparent)]
    Lock(#[from] LockError),
}
