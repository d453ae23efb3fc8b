//! In-memory index of all known record versions.

use parking_lot::RwLock;
use plexdb_model::Record;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Per-type slice of the cache.
///
/// Scan order is first-insertion order; re-inserting a version id
/// replaces the record in place without moving it.
#[derive(Debug, Default)]
struct TypeCache {
    by_version: HashMap<Uuid, usize>,
    records: Vec<Arc<Record>>,
}

impl TypeCache {
    fn insert(&mut self, record: Arc<Record>) {
        match self.by_version.get(&record.version_id()) {
            Some(&index) => self.records[index] = record,
            None => {
                self.by_version.insert(record.version_id(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

/// Two-level index: item type name → version id → record.
///
/// One lock guards the whole cache. Both the caller thread (create,
/// supersede, load) and the downloader (load) mutate it through
/// [`VersionCache::insert`]; readers take snapshots and never observe a
/// partially inserted record.
#[derive(Debug, Default)]
pub struct VersionCache {
    inner: RwLock<HashMap<String, TypeCache>>,
}

impl VersionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any prior record with its version id.
    pub fn insert(&self, record: Arc<Record>) {
        let mut inner = self.inner.write();
        inner
            .entry(record.item_type().name().to_string())
            .or_default()
            .insert(record);
    }

    /// Point lookup by type name and version id.
    #[must_use]
    pub fn get(&self, type_name: &str, version_id: Uuid) -> Option<Arc<Record>> {
        let inner = self.inner.read();
        let types = inner.get(type_name)?;
        let index = *types.by_version.get(&version_id)?;
        Some(Arc::clone(&types.records[index]))
    }

    /// Snapshot of a type's records in cache insertion order.
    #[must_use]
    pub fn scan(&self, type_name: &str) -> Vec<Arc<Record>> {
        self.inner
            .read()
            .get(type_name)
            .map(|types| types.records.clone())
            .unwrap_or_default()
    }

    /// Number of cached versions for a type.
    #[must_use]
    pub fn len(&self, type_name: &str) -> usize {
        self.inner
            .read()
            .get(type_name)
            .map_or(0, |types| types.records.len())
    }

    /// Returns true if no version of the type is cached.
    #[must_use]
    pub fn is_empty(&self, type_name: &str) -> bool {
        self.len(type_name) == 0
    }
}
