//! The session: orchestrator of cache, catalog, log and clock.

use crate::cache::VersionCache;
use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};
use crate::progress::Progress;
use crate::queue::UploadQueue;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use plexdb_model::{
    xml, Catalog, ItemQuery, ItemType, Record, RecordKind, RelationshipQuery, TypeKind,
};
use plexdb_store::{CommitClock, StoreDir};
use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A versioned object store session.
///
/// The session exclusively owns the version cache; every record enters
/// it through [`VersionCache::insert`], whether created by the caller,
/// loaded from the local log, or pulled from the remote store. Records
/// are constructed by callers but become visible to queries only once
/// cached, and durable only once their transaction commits.
pub struct Session {
    config: SessionConfig,
    catalog: Catalog,
    cache: VersionCache,
    store: StoreDir,
    clock: CommitClock,
    loaded: Mutex<HashSet<i64>>,
    upload_queue: UploadQueue,
    progress: Progress,
}

impl Session {
    /// Opens a session rooted at the configured local cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store layout cannot be created.
    pub fn open(config: SessionConfig) -> CoreResult<Self> {
        let store = StoreDir::open(&config.database_root())?;
        Ok(Self {
            config,
            catalog: Catalog::new(),
            cache: VersionCache::new(),
            store,
            clock: CommitClock::new(),
            loaded: Mutex::new(HashSet::new()),
            upload_queue: UploadQueue::new(),
            progress: Progress::new(),
        })
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the schema catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the local store.
    #[must_use]
    pub fn store(&self) -> &StoreDir {
        &self.store
    }

    /// Returns the queue of committed transactions pending upload.
    #[must_use]
    pub fn upload_queue(&self) -> &UploadQueue {
        &self.upload_queue
    }

    /// Returns the sync progress state.
    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Registers an item type; re-registering a name replaces it.
    pub fn register_item_type(&self, item_type: ItemType) -> Arc<ItemType> {
        self.catalog.register(item_type)
    }

    /// Registers a relationship type; re-registering a name replaces it.
    ///
    /// # Errors
    ///
    /// Fails if the type is not a relationship type.
    pub fn register_relationship_type(&self, item_type: ItemType) -> CoreResult<Arc<ItemType>> {
        if item_type.kind() != TypeKind::Relationship {
            return Err(CoreError::Model(plexdb_model::ModelError::kind_mismatch(
                item_type.name(),
                TypeKind::Relationship.to_string(),
            )));
        }
        Ok(self.catalog.register(item_type))
    }

    /// Resolves a registered item type by name.
    pub fn item_type(&self, name: &str) -> CoreResult<Arc<ItemType>> {
        Ok(self.catalog.resolve(name)?)
    }

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotInitialised`] until the downloader's
    /// first full reconciliation pass has completed. Fails fast; the
    /// caller decides whether to poll or subscribe to progress events.
    pub fn begin_transaction(&self) -> CoreResult<Transaction<'_>> {
        if !self.progress.is_initialised() {
            return Err(CoreError::NotInitialised);
        }
        Ok(Transaction::new(self))
    }

    /// Takes ownership of a caller-built record and stages it.
    ///
    /// The record is cached immediately, so it is visible to queries in
    /// this process before the transaction commits; it becomes durable
    /// and replicated only at commit.
    pub fn create(
        &self,
        record: Record,
        transaction: &mut Transaction<'_>,
    ) -> CoreResult<Arc<Record>> {
        let record = Arc::new(record);
        self.cache.insert(Arc::clone(&record));
        transaction.stage(Arc::clone(&record));
        Ok(record)
    }

    /// Supersedes a cached version at the given timestamp.
    ///
    /// The superseded record is re-staged so the supersession is itself
    /// durable and replicated.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::VersionNotFound`] if the version is not
    /// cached.
    pub fn supersede(
        &self,
        item_type: &ItemType,
        version_id: Uuid,
        superseded_at: i64,
        transaction: &mut Transaction<'_>,
    ) -> CoreResult<Arc<Record>> {
        let record = self
            .cache
            .get(item_type.name(), version_id)
            .ok_or_else(|| CoreError::version_not_found(item_type.name(), version_id))?;
        record.set_superseded(superseded_at);
        transaction.stage(Arc::clone(&record));
        Ok(record)
    }

    /// Returns the current (non-superseded) version of a branch.
    ///
    /// Absence is a valid, expected result, not an error.
    pub fn current(
        &self,
        item_type: &ItemType,
        branch_id: Uuid,
    ) -> CoreResult<Option<Arc<Record>>> {
        self.load()?;
        Ok(self
            .cache
            .scan(item_type.name())
            .into_iter()
            .find(|record| record.is_current() && record.branch_id() == branch_id))
    }

    /// Returns every record matching an item query.
    pub fn query_items(&self, query: &ItemQuery) -> CoreResult<Vec<Arc<Record>>> {
        self.load()?;
        let mut matched = Vec::new();
        for record in self.cache.scan(query.item_type().name()) {
            if record.matches_item_query(query)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Returns every relationship matching a relationship query.
    pub fn query_relationships(
        &self,
        query: &RelationshipQuery,
    ) -> CoreResult<Vec<Arc<Record>>> {
        self.load()?;
        let mut matched = Vec::new();
        for record in self.cache.scan(query.item().item_type().name()) {
            if record.matches_relationship_query(query)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Loads all committed, not-yet-loaded transactions into the cache.
    ///
    /// Directories are applied in ascending commit order, so a version
    /// serialized into several transactions (supersession re-writes the
    /// record) converges on the latest copy. Marker-less directories
    /// are skipped. A parse or schema-resolution failure aborts the
    /// pass: a corrupt catalog cannot be partially trusted.
    pub fn load(&self) -> CoreResult<()> {
        let mut loaded = self.loaded.lock();
        for commit_time in self.store.list_committed()? {
            if loaded.contains(&commit_time) {
                continue;
            }
            for path in self.store.record_files(commit_time)? {
                let bytes = fs::read(&path)?;
                let record = xml::deserialize(&bytes, &self.catalog)?;
                self.cache.insert(Arc::new(record));
            }
            loaded.insert(commit_time);
            self.clock.observe(commit_time);
            debug!(commit_time, "loaded transaction");
        }
        Ok(())
    }

    /// Opens a file record's payload for reading.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotAFile`] for non-file records.
    pub fn read_vault(&self, record: &Record) -> CoreResult<File> {
        self.require_file(record)?;
        Ok(self.store.vault_read(record.version_id())?)
    }

    /// Opens a file record's payload for writing.
    pub fn write_vault(&self, record: &Record) -> CoreResult<File> {
        self.require_file(record)?;
        Ok(self.store.vault_write(record.version_id())?)
    }

    fn require_file(&self, record: &Record) -> CoreResult<()> {
        if record.kind() != RecordKind::File {
            return Err(CoreError::not_a_file(record.version_id()));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &VersionCache {
        &self.cache
    }

    pub(crate) fn clock(&self) -> &CommitClock {
        &self.clock
    }

    pub(crate) fn mark_loaded(&self, commit_time: i64) {
        self.loaded.lock().insert(commit_time);
    }
}
