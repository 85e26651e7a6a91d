//! Storage error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the relay configuration store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored record could not be encoded or decoded.
    #[error("invalid relay record: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn file_io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
