//! Remote blob naming scheme.

use plexdb_core::SessionConfig;

const ARCHIVE_SUFFIX: &str = ".txn.tar";
const MARKER_SUFFIX: &str = ".committed";

/// Blob paths under the `<supplier>/<project>/Database/` hierarchy.
///
/// Each transaction is mirrored as two blobs: a single archive of its
/// record files plus referenced vault payloads, and a distinctly named
/// commit marker uploaded only after the archive. The marker's presence
/// is the sole signal of remote durability, mirroring the local
/// protocol.
#[derive(Debug, Clone)]
pub struct RemoteLayout {
    base: String,
}

impl RemoteLayout {
    /// Creates the layout for a supplier/project location.
    pub fn new(supplier: &str, project: &str) -> Self {
        Self {
            base: format!("{supplier}/{project}/Database/"),
        }
    }

    /// Creates the layout matching a session's configured location.
    #[must_use]
    pub fn for_session(config: &SessionConfig) -> Self {
        Self::new(&config.supplier, &config.project)
    }

    /// Returns the prefix under which all database blobs live.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.base
    }

    /// Returns the archive blob path for a transaction.
    #[must_use]
    pub fn archive_path(&self, commit_time: i64) -> String {
        format!("{}{commit_time}{ARCHIVE_SUFFIX}", self.base)
    }

    /// Returns the commit marker blob path for a transaction.
    #[must_use]
    pub fn marker_path(&self, commit_time: i64) -> String {
        format!("{}{commit_time}{MARKER_SUFFIX}", self.base)
    }

    /// Extracts the commit time from a marker blob name, if it is one.
    #[must_use]
    pub fn parse_marker(&self, name: &str) -> Option<i64> {
        name.strip_prefix(&self.base)?
            .strip_suffix(MARKER_SUFFIX)?
            .parse()
            .ok()
    }
}
