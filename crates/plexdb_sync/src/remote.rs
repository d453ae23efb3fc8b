//! The remote blob store contract.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A remote document store consumed through coarse blob operations.
///
/// Any blob store with hierarchical naming satisfies this contract;
/// transport and authentication live behind the implementation. All
/// methods may block their calling thread (the sync loops run on their
/// own threads) and any error aborts the current reconciliation pass.
pub trait RemoteStore: Send + Sync {
    /// Lists blob names starting with `prefix`.
    fn list(&self, prefix: &str) -> SyncResult<Vec<String>>;

    /// Uploads a blob, replacing any existing blob at `path`.
    fn upload(&self, path: &str, bytes: &[u8]) -> SyncResult<()>;

    /// Downloads a blob.
    fn download(&self, path: &str) -> SyncResult<Vec<u8>>;
}

/// In-memory remote store for tests.
///
/// Counts uploads and supports failure injection so tests can assert
/// idempotence and retry behavior.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    uploads: AtomicU64,
    fail_uploads: AtomicBool,
    fail_lists: AtomicBool,
    fail_downloads: AtomicBool,
}

impl MemoryRemote {
    /// Creates an empty remote store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of successful uploads.
    #[must_use]
    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Returns true if a blob exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().contains_key(path)
    }

    /// Makes subsequent uploads fail until cleared.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent lists fail until cleared.
    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent downloads fail until cleared.
    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }
}

impl RemoteStore for MemoryRemote {
    fn list(&self, prefix: &str) -> SyncResult<Vec<String>> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(SyncError::remote("injected list failure"));
        }
        Ok(self
            .blobs
            .lock()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn upload(&self, path: &str, bytes: &[u8]) -> SyncResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(SyncError::remote("injected upload failure"));
        }
        self.blobs.lock().insert(path.to_string(), bytes.to_vec());
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn download(&self, path: &str) -> SyncResult<Vec<u8>> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(SyncError::remote("injected download failure"));
        }
        self.blobs
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::remote(format!("no blob at {path}")))
    }
}
