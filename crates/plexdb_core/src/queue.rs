//! FIFO of committed transactions pending upload.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Commit timestamps of local transactions awaiting upload.
///
/// Single producer (the committing caller thread), single consumer (the
/// uploader loop). The lock is held only for the queue operation
/// itself, so enqueueing never blocks the committing caller behind an
/// upload in flight. The consumer peeks the head, uploads, and pops
/// only after the remote marker upload succeeds; a failed upload leaves
/// the head in place for retry.
#[derive(Debug, Default)]
pub struct UploadQueue {
    inner: Mutex<VecDeque<i64>>,
}

impl UploadQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a committed transaction.
    pub fn push(&self, commit_time: i64) {
        self.inner.lock().push_back(commit_time);
    }

    /// Returns the head of the queue without removing it.
    #[must_use]
    pub fn front(&self) -> Option<i64> {
        self.inner.lock().front().copied()
    }

    /// Removes and returns the head of the queue.
    pub fn pop(&self) -> Option<i64> {
        self.inner.lock().pop_front()
    }

    /// Returns the number of pending transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
