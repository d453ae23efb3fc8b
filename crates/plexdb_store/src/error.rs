//! Error types for the plexdb store.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A store path exists but is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A transaction directory was expected to exist.
    #[error("no transaction directory for commit time {commit_time}")]
    TransactionMissing {
        /// The commit timestamp looked up.
        commit_time: i64,
    },
}

impl StoreError {
    /// Creates a not-a-directory error.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    /// Creates a missing-transaction error.
    pub fn transaction_missing(commit_time: i64) -> Self {
        Self::TransactionMissing { commit_time }
    }
}
