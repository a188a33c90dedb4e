//! Per-client sliding-window admission control.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per client within one window
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Paths that bypass admission control
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
            exempt_paths: default_exempt_paths(),
        }
    }
}

impl RateLimitConfig {
    /// Settings with the given limit per window
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window_secs: window.as_secs(),
            ..Self::default()
        }
    }

    /// Window as a duration
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

const fn default_limit() -> u32 {
    100
}

const fn default_window_secs() -> u64 {
    60
}

fn default_exempt_paths() -> Vec<String> {
    vec![String::from("/health")]
}

/// Admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request recorded and allowed
    Admitted {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Path is exempt; nothing recorded
    Exempt,
    /// Limit reached, try later
    Rejected {
        /// Hint for the `Retry-After` header (the window length)
        retry_after: Duration,
    },
}

impl Admission {
    /// Returns true unless the request was rejected
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

struct Windows {
    clients: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl Windows {
    /// Drop clients with no timestamp inside the window
    fn sweep(&mut self, now: Instant, window: Duration) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, history| {
            history
                .back()
                .is_some_and(|t| now.duration_since(*t) < window)
        });
        self.last_sweep = now;
        before - self.clients.len()
    }
}

/// Sliding-window limiter keyed by client identifier (e.g. source address).
///
/// Idle clients are swept from inside [`RateLimiter::check`] at most once
/// per window, so the map stays bounded by the clients active in the last
/// two windows.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<Windows>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    /// Create a limiter
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(Windows {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Active settings
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admission check for a request to `path`; exempt paths always pass
    pub fn check_path(&self, path: &str, client: &str) -> Admission {
        if self.config.exempt_paths.iter().any(|p| p == path) {
            return Admission::Exempt;
        }
        self.check(client)
    }

    /// Prune the client's history, then admit and record or reject
    pub fn check(&self, client: &str) -> Admission {
        let now = Instant::now();
        let window = self.config.window();
        let mut windows = self.windows.lock();

        if now.duration_since(windows.last_sweep) >= window {
            let evicted = windows.sweep(now, window);
            if evicted > 0 {
                debug!(evicted, "evicted idle rate-limit clients");
            }
        }

        let history = windows.clients.entry(client.to_string()).or_default();

        while history
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            history.pop_front();
        }

        let used = u32::try_from(history.len()).unwrap_or(u32::MAX);
        if used >= self.config.limit {
            debug!(client, used, limit = self.config.limit, "rate limit exceeded");
            return Admission::Rejected {
                retry_after: window,
            };
        }

        history.push_back(now);
        Admission::Admitted {
            remaining: self.config.limit - used - 1,
        }
    }

    /// Drop clients whose whole history has aged out; returns how many
    pub fn evict_idle(&self) -> usize {
        self.windows
            .lock()
            .sweep(Instant::now(), self.config.window())
    }

    /// Number of clients with tracked history
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().clients.len()
    }
}
