//! The downloader: pulls remote transactions into the local log.

use crate::bundle::unpack_transaction;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::layout::RemoteLayout;
use crate::remote::RemoteStore;
use parking_lot::Mutex;
use plexdb_core::Session;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Polls the remote store and pulls missing committed transactions.
///
/// The first fully successful pass flips the session's `initialised`
/// flag, which is what permits local commits and uploader activity.
/// Every later pass keeps the local log caught up. A remote error
/// aborts the current pass; transactions already downloaded stay
/// downloaded.
pub struct Downloader {
    session: Arc<Session>,
    remote: Arc<dyn RemoteStore>,
    layout: RemoteLayout,
    config: SyncConfig,
    downloaded: Mutex<HashSet<i64>>,
    cancel: Arc<AtomicBool>,
}

impl Downloader {
    /// Creates a downloader for a session and remote store.
    pub fn new(
        session: Arc<Session>,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let layout = RemoteLayout::for_session(session.config());
        Self {
            session,
            remote,
            layout,
            config,
            downloaded: Mutex::new(HashSet::new()),
            cancel,
        }
    }

    /// Runs reconciliation passes until cancelled.
    ///
    /// Errors never escape: a failed pass is logged and retried after
    /// the polling interval.
    pub fn run(&self) {
        while !self.cancel.load(Ordering::Acquire) {
            match self.pass() {
                Ok(fetched) => {
                    debug!(fetched, "download pass complete");
                    if self.session.progress().mark_initialised() {
                        info!("first reconciliation pass complete, session initialised");
                    }
                }
                Err(error) => warn!(%error, "download pass failed"),
            }
            self.sleep();
        }
    }

    /// Performs one reconciliation pass. Returns the number of
    /// transactions fetched.
    pub fn pass(&self) -> SyncResult<usize> {
        let progress = self.session.progress();
        progress.set_reading(true);
        let result = self.reconcile();
        progress.set_reading(false);
        result
    }

    fn reconcile(&self) -> SyncResult<usize> {
        let names = self.remote.list(self.layout.prefix())?;
        let mut remote_ids: Vec<i64> = names
            .iter()
            .filter_map(|name| self.layout.parse_marker(name))
            .collect();
        remote_ids.sort_unstable();

        let mut downloaded = self.downloaded.lock();
        let missing: Vec<i64> = remote_ids
            .into_iter()
            .filter(|id| {
                if downloaded.contains(id) {
                    return false;
                }
                // Already fully present locally: count as downloaded
                // without re-fetching.
                if self.session.store().is_committed(*id) {
                    downloaded.insert(*id);
                    return false;
                }
                true
            })
            .collect();

        let progress = self.session.progress();
        progress.set_reading_total(missing.len() as u64);

        let mut fetched = 0;
        for (index, id) in missing.iter().enumerate() {
            progress.set_reading_number(index as u64 + 1);
            let bytes = self.remote.download(&self.layout.archive_path(*id))?;
            unpack_transaction(self.session.store(), *id, &bytes)?;
            downloaded.insert(*id);
            fetched += 1;
            debug!(commit_time = id, "downloaded transaction");
        }
        drop(downloaded);

        // Pull the fresh directories into the cache.
        self.session.load()?;
        Ok(fetched)
    }

    fn sleep(&self) {
        // Sleep in short slices so cancellation is prompt.
        let mut remaining = self.config.poll_interval;
        let slice = std::time::Duration::from_millis(50);
        while !remaining.is_zero() && !self.cancel.load(Ordering::Acquire) {
            let nap = remaining.min(slice);
            thread::sleep(nap);
            remaining -= nap;
        }
    }
}
