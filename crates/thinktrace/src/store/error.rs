//! Errors raised by session stores.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a snapshot file failed.
    #[error("I/O error at {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file exists but is not a readable session snapshot.
    #[error("malformed snapshot at {path}: {message}")]
    FileDeserialization { path: PathBuf, message: String },

    #[error("snapshot at {path} has schema version {found}, expected {expected}")]
    FileIncompatibleSchema {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    /// The snapshot stored under one id belongs to another session.
    #[error("snapshot at {path} holds session {found:?}, expected {expected:?}")]
    SessionIdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A session could not be encoded for storage.
    #[error("failed to encode session: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session ids become directory names, so they must be one plain path component.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

impl StorageError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
