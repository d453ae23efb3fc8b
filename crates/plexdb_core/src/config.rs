//! Session configuration.

use std::path::{Path, PathBuf};

/// Configuration for opening a session.
///
/// The local store root is derived from the remote location: the same
/// supplier/project pair addresses `<supplier>/<project>/Database/` on
/// the remote store and `<local_cache>/<supplier>/<project>/Database`
/// on disk.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root directory for all locally cached databases.
    pub local_cache: PathBuf,
    /// Supplier segment of the database location.
    pub supplier: String,
    /// Project segment of the database location.
    pub project: String,
}

impl SessionConfig {
    /// Creates a session configuration.
    pub fn new(
        local_cache: impl Into<PathBuf>,
        supplier: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            local_cache: local_cache.into(),
            supplier: supplier.into(),
            project: project.into(),
        }
    }

    /// Returns the local database root for this location.
    #[must_use]
    pub fn database_root(&self) -> PathBuf {
        self.local_cache
            .join(&self.supplier)
            .join(&self.project)
            .join("Database")
    }

    /// Sets the local cache root.
    #[must_use]
    pub fn with_local_cache(mut self, path: impl AsRef<Path>) -> Self {
        self.local_cache = path.as_ref().to_path_buf();
        self
    }
}
