//! Background sync engine: downloader and uploader on their own threads.

use crate::config::SyncConfig;
use crate::downloader::Downloader;
use crate::error::SyncResult;
use crate::remote::RemoteStore;
use crate::uploader::Uploader;
use plexdb_core::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Runs the downloader and uploader loops on background threads.
///
/// Both loops share one cancellation flag. `shutdown` sets it and joins
/// the threads; dropping the engine sets it without joining, letting
/// the threads wind down on their own.
pub struct SyncEngine {
    cancel: Arc<AtomicBool>,
    downloader: Option<JoinHandle<()>>,
    uploader: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Starts the sync loops for a session against a remote store.
    ///
    /// # Errors
    ///
    /// Fails only if a background thread cannot be spawned.
    pub fn start(
        session: Arc<Session>,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let cancel = Arc::new(AtomicBool::new(false));

        let downloader = Downloader::new(
            Arc::clone(&session),
            Arc::clone(&remote),
            config.clone(),
            Arc::clone(&cancel),
        );
        let downloader = thread::Builder::new()
            .name("plexdb-downloader".into())
            .spawn(move || downloader.run())?;

        let uploader = Uploader::new(session, remote, config, Arc::clone(&cancel));
        let uploader = thread::Builder::new()
            .name("plexdb-uploader".into())
            .spawn(move || uploader.run())?;

        info!("sync engine started");
        Ok(Self {
            cancel,
            downloader: Some(downloader),
            uploader: Some(uploader),
        })
    }

    /// Stops both loops and waits for their threads to exit.
    pub fn shutdown(mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.downloader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.uploader.take() {
            let _ = handle.join();
        }
        debug!("sync engine stopped");
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}
