//! Error types for plexdb core.

use plexdb_model::ModelError;
use plexdb_store::StoreError;
use std::io;
use thiserror::Error;
use uuid::Uuid;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A transaction was requested before the first full reconciliation
    /// pass completed. Caller-recoverable by retrying later.
    #[error("session not initialised: first reconciliation pass has not completed")]
    NotInitialised,

    /// Lookup of a required existing version failed.
    #[error("version {version_id} of {item_type} not found")]
    VersionNotFound {
        /// The item type searched.
        item_type: String,
        /// The version id that was not found.
        version_id: Uuid,
    },

    /// A vault operation was attempted on a non-file record.
    #[error("record {version_id} is not a file record")]
    NotAFile {
        /// The offending record's version id.
        version_id: Uuid,
    },

    /// Model error (format, schema resolution, capability gap).
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a version-not-found error.
    pub fn version_not_found(item_type: impl Into<String>, version_id: Uuid) -> Self {
        Self::VersionNotFound {
            item_type: item_type.into(),
            version_id,
        }
    }

    /// Creates a not-a-file error.
    pub fn not_a_file(version_id: Uuid) -> Self {
        Self::NotAFile { version_id }
    }
}
