//! The uploader: pushes committed local transactions to the remote store.

use crate::bundle::pack_transaction;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::layout::RemoteLayout;
use crate::remote::RemoteStore;
use plexdb_core::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Drains the upload queue in commit (FIFO) order.
///
/// For each queued transaction: a vanished local marker is skipped, an
/// existing remote marker dequeues without re-uploading, otherwise the
/// bundle is uploaded and the remote marker last. The head is dequeued
/// only after the marker upload succeeds, so an error leaves it in
/// place for retry on the next pass. Retrying in FIFO order means a
/// persistently failing transaction stalls later ones; in-order
/// delivery is preserved at the cost of head-of-line blocking.
pub struct Uploader {
    session: Arc<Session>,
    remote: Arc<dyn RemoteStore>,
    layout: RemoteLayout,
    config: SyncConfig,
    cancel: Arc<AtomicBool>,
}

impl Uploader {
    /// Creates an uploader for a session and remote store.
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
            cancel,
        }
    }

    /// Runs drain passes until cancelled.
    ///
    /// Stays idle until the downloader signals initialisation. Errors
    /// never escape: a failed drain is logged and retried after the
    /// upload interval.
    pub fn run(&self) {
        while !self.cancel.load(Ordering::Acquire) {
            if !self.session.progress().is_initialised() {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            match self.drain() {
                Ok(pushed) => debug!(pushed, "upload drain complete"),
                Err(error) => warn!(%error, "upload drain failed"),
            }
            self.sleep();
        }
    }

    /// Drains the pending queue once. Returns the number of
    /// transactions uploaded.
    pub fn drain(&self) -> SyncResult<usize> {
        let progress = self.session.progress();
        let queue = self.session.upload_queue();
        if queue.is_empty() {
            return Ok(0);
        }

        progress.set_writing(true);
        progress.set_writing_total(queue.len() as u64);
        let result = self.drain_queue();
        progress.set_writing(false);
        result
    }

    fn drain_queue(&self) -> SyncResult<usize> {
        let progress = self.session.progress();
        let queue = self.session.upload_queue();
        let mut pushed = 0;
        let mut number = 0;

        while let Some(commit_time) = queue.front() {
            if self.cancel.load(Ordering::Acquire) {
                break;
            }
            number += 1;
            progress.set_writing_number(number);

            // A queued id whose local marker vanished is skipped, not
            // retried.
            if !self.session.store().is_committed(commit_time) {
                warn!(commit_time, "queued transaction has no local marker, skipping");
                queue.pop();
                continue;
            }

            if self.remote_has_marker(commit_time)? {
                debug!(commit_time, "already uploaded, dequeueing");
                queue.pop();
                continue;
            }

            let bytes = pack_transaction(self.session.store(), commit_time)?;
            self.remote
                .upload(&self.layout.archive_path(commit_time), &bytes)?;
            // Marker last: its presence is the sole signal of remote
            // durability.
            self.remote
                .upload(&self.layout.marker_path(commit_time), &[])?;

            queue.pop();
            pushed += 1;
            debug!(commit_time, "uploaded transaction");
        }
        Ok(pushed)
    }

    fn remote_has_marker(&self, commit_time: i64) -> SyncResult<bool> {
        let marker = self.layout.marker_path(commit_time);
        Ok(self
            .remote
            .list(&marker)?
            .iter()
            .any(|name| name == &marker))
    }

    fn sleep(&self) {
        let mut remaining = self.config.upload_interval;
        let slice = Duration::from_millis(50);
        while !remaining.is_zero() && !self.cancel.load(Ordering::Acquire) {
            let nap = remaining.min(slice);
            thread::sleep(nap);
            remaining -= nap;
        }
    }
}
