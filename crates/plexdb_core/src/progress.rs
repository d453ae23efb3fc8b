//! Sync progress counters with change notification.
//!
//! The downloader and uploader publish advisory progress here. The
//! `initialised` flag is the one correctness-relevant bit: it gates
//! `Session::begin_transaction` until the downloader's first full
//! reconciliation pass completes.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// A progress change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The downloader started or stopped a pass.
    Reading(bool),
    /// Number of remote transactions the current pass will fetch.
    ReadingTotal(u64),
    /// Index of the remote transaction currently being fetched.
    ReadingNumber(u64),
    /// The uploader started or stopped a drain.
    Writing(bool),
    /// Number of local transactions the current drain will push.
    WritingTotal(u64),
    /// Index of the local transaction currently being pushed.
    WritingNumber(u64),
    /// The first full reconciliation pass completed.
    Initialised,
}

/// Concurrently readable progress counters and flags.
///
/// Observers subscribe through a channel. Events are sent after the
/// underlying value is published and never while holding the
/// subscriber lock for writing, so an observer can read counters from
/// inside its handler without deadlocking.
#[derive(Debug, Default)]
pub struct Progress {
    reading: AtomicBool,
    reading_total: AtomicU64,
    reading_number: AtomicU64,
    writing: AtomicBool,
    writing_total: AtomicU64,
    writing_number: AtomicU64,
    initialised: AtomicBool,
    subscribers: RwLock<Vec<Sender<ProgressEvent>>>,
}

impl Progress {
    /// Creates progress state with nothing reported yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to progress change notifications.
    pub fn subscribe(&self) -> Receiver<ProgressEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.write().push(sender);
        receiver
    }

    fn emit(&self, event: ProgressEvent) {
        // Clone senders under the read lock, send outside it. Sends to
        // dropped receivers fail harmlessly.
        let senders: Vec<Sender<ProgressEvent>> = self.subscribers.read().clone();
        for sender in &senders {
            let _ = sender.send(event);
        }
    }

    /// Returns true if a download pass is in progress.
    #[must_use]
    pub fn reading(&self) -> bool {
        self.reading.load(Ordering::Acquire)
    }

    /// Sets the download-pass flag.
    pub fn set_reading(&self, value: bool) {
        self.reading.store(value, Ordering::Release);
        self.emit(ProgressEvent::Reading(value));
    }

    /// Returns the current pass's fetch total.
    #[must_use]
    pub fn reading_total(&self) -> u64 {
        self.reading_total.load(Ordering::Acquire)
    }

    /// Sets the current pass's fetch total.
    pub fn set_reading_total(&self, value: u64) {
        self.reading_total.store(value, Ordering::Release);
        self.emit(ProgressEvent::ReadingTotal(value));
    }

    /// Returns the index of the transaction currently being fetched.
    #[must_use]
    pub fn reading_number(&self) -> u64 {
        self.reading_number.load(Ordering::Acquire)
    }

    /// Sets the index of the transaction currently being fetched.
    pub fn set_reading_number(&self, value: u64) {
        self.reading_number.store(value, Ordering::Release);
        self.emit(ProgressEvent::ReadingNumber(value));
    }

    /// Returns true if an upload drain is in progress.
    #[must_use]
    pub fn writing(&self) -> bool {
        self.writing.load(Ordering::Acquire)
    }

    /// Sets the upload-drain flag.
    pub fn set_writing(&self, value: bool) {
        self.writing.store(value, Ordering::Release);
        self.emit(ProgressEvent::Writing(value));
    }

    /// Returns the current drain's push total.
    #[must_use]
    pub fn writing_total(&self) -> u64 {
        self.writing_total.load(Ordering::Acquire)
    }

    /// Sets the current drain's push total.
    pub fn set_writing_total(&self, value: u64) {
        self.writing_total.store(value, Ordering::Release);
        self.emit(ProgressEvent::WritingTotal(value));
    }

    /// Returns the index of the transaction currently being pushed.
    #[must_use]
    pub fn writing_number(&self) -> u64 {
        self.writing_number.load(Ordering::Acquire)
    }

    /// Sets the index of the transaction currently being pushed.
    pub fn set_writing_number(&self, value: u64) {
        self.writing_number.store(value, Ordering::Release);
        self.emit(ProgressEvent::WritingNumber(value));
    }

    /// Returns true once the first full reconciliation pass completed.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    /// Flips the initialised flag, at most once.
    ///
    /// Returns true if this call performed the flip.
    pub fn mark_initialised(&self) -> bool {
        let flipped = self
            .initialised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if flipped {
            self.emit(ProgressEvent::Initialised);
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialised_flips_exactly_once() {
        let progress = Progress::new();
        assert!(!progress.is_initialised());
        assert!(progress.mark_initialised());
        assert!(!progress.mark_initialised());
        assert!(progress.is_initialised());
    }

    #[test]
    fn subscriber_sees_value_before_event() {
        let progress = Progress::new();
        let receiver = progress.subscribe();

        progress.set_reading_total(7);
        assert_eq!(receiver.recv().unwrap(), ProgressEvent::ReadingTotal(7));
        assert_eq!(progress.reading_total(), 7);
    }

    #[test]
    fn dropped_subscriber_does_not_stall_others() {
        let progress = Progress::new();
        let dead = progress.subscribe();
        drop(dead);
        let live = progress.subscribe();

        progress.set_writing(true);
        progress.set_writing(false);
        assert_eq!(live.recv().unwrap(), ProgressEvent::Writing(true));
        assert_eq!(live.recv().unwrap(), ProgressEvent::Writing(false));
    }
}
