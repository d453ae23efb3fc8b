//! Error types for the sync engine.

use plexdb_core::CoreError;
use plexdb_store::StoreError;
use std::io;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote store access failed. Caught at the loop boundary and
    /// retried after the sleep interval.
    #[error("remote store error: {message}")]
    Remote {
        /// Error message from the remote store.
        message: String,
    },

    /// A transaction bundle is malformed.
    #[error("bundle error: {message}")]
    Bundle {
        /// Description of the problem.
        message: String,
    },

    /// Core error during reconciliation.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Store error during reconciliation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// Creates a remote store error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates a bundle error.
    pub fn bundle(message: impl Into<String>) -> Self {
        Self::Bundle {
            message: message.into(),
        }
    }
}
