//! Monotonic logical commit clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A strictly-increasing 64-bit logical clock for commit timestamps.
///
/// Values track wall-clock nanoseconds since the Unix epoch, but every
/// value handed out is strictly greater than any value previously
/// assigned or observed by this clock, even if the wall clock stalls or
/// steps backwards. Commit timestamps double as transaction directory
/// names, so uniqueness is load-bearing.
#[derive(Debug, Default)]
pub struct CommitClock {
    last: AtomicI64,
}

impl CommitClock {
    /// Creates a clock that has observed nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next commit timestamp.
    pub fn next(&self) -> i64 {
        let wall = wall_nanos();
        loop {
            let last = self.last.load(Ordering::SeqCst);
            let next = wall.max(last.saturating_add(1));
            if self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }

    /// Advances the clock past an externally observed timestamp.
    ///
    /// Loaded and downloaded transaction directories feed their commit
    /// times through here so locally assigned times never collide with
    /// existing directory names.
    pub fn observe(&self, seen: i64) {
        self.last.fetch_max(seen, Ordering::SeqCst);
    }
}

fn wall_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing() {
        let clock = CommitClock::new();
        let mut previous = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn observe_advances_past_seen_values() {
        let clock = CommitClock::new();
        let far_future = i64::MAX - 10;
        clock.observe(far_future);
        assert!(clock.next() > far_future);
    }

    #[test]
    fn concurrent_assignment_is_unique() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let clock = Arc::new(CommitClock::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let clock = Arc::clone(&clock);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| clock.next()).collect::<Vec<_>>()
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "duplicate commit time {value}");
            }
        }
    }
}
