//! Scanner configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gate::DEFAULT_MAX_CONCURRENCY;

/// Shortest allowed gap between analysis status polls
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables for attachment scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Concurrent reputation-service calls across the process
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds between analysis status polls; values below one are
    /// treated as one
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds of polling before giving up on an analysis
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Seconds a fetched report stays in the local cache
    #[serde(default = "default_report_ttl")]
    pub report_ttl_secs: u64,

    /// Optional outbound cap on service calls per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            report_ttl_secs: default_report_ttl(),
            requests_per_minute: None,
        }
    }
}

impl ScanConfig {
    /// Set the concurrency cap
    #[must_use]
    pub const fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the poll interval, rounded up to whole seconds and never below
    /// [`MIN_POLL_INTERVAL`]
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        let secs = ceil_secs(interval);
        self.poll_interval_secs = if secs < MIN_POLL_INTERVAL.as_secs() {
            MIN_POLL_INTERVAL.as_secs()
        } else {
            secs
        };
        self
    }

    /// Set the polling budget, rounded up to whole seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = ceil_secs(timeout);
        self
    }

    /// Poll interval as a duration, at least [`MIN_POLL_INTERVAL`]
    #[must_use]
    pub const fn poll_interval_duration(&self) -> Duration {
        if self.poll_interval_secs < MIN_POLL_INTERVAL.as_secs() {
            MIN_POLL_INTERVAL
        } else {
            Duration::from_secs(self.poll_interval_secs)
        }
    }

    /// Polling budget as a duration
    #[must_use]
    pub const fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Report cache lifetime as a duration
    #[must_use]
    pub const fn report_ttl(&self) -> Duration {
        Duration::from_secs(self.report_ttl_secs)
    }
}

const fn ceil_secs(duration: Duration) -> u64 {
    if duration.subsec_nanos() > 0 {
        duration.as_secs().saturating_add(1)
    } else {
        duration.as_secs()
    }
}

// Default value functions for serde.
const fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

const fn default_poll_interval() -> u64 {
    15
}

const fn default_timeout() -> u64 {
    180
}

const fn default_report_ttl() -> u64 {
    300
}
