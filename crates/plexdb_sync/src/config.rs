//! Configuration for the sync loops.

use std::time::Duration;

/// Minimum polling interval; shorter configured values are clamped.
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the downloader and uploader loops.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sleep between downloader reconciliation passes.
    pub poll_interval: Duration,
    /// Sleep between uploader drain passes.
    pub upload_interval: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the given polling interval.
    ///
    /// The interval is clamped to a minimum of one second.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            upload_interval: Duration::from_secs(1),
        }
    }

    /// Sets the polling interval, clamped to a minimum of one second.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Sets the sleep between uploader drain passes.
    #[must_use]
    pub fn with_upload_interval(mut self, interval: Duration) -> Self {
        self.upload_interval = interval;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_clamped_to_minimum() {
        let config = SyncConfig::new(Duration::from_millis(10));
        assert_eq!(config.poll_interval, Duration::from_secs(1));

        let config = config.with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_secs(1));

        let config = config.with_poll_interval(Duration::from_secs(90));
        assert_eq!(config.poll_interval, Duration::from_secs(90));
    }
}
