//! Runtime settings for a [`Detector`](crate::Detector).

use phishnet_client::DEFAULT_BASE_URL;
use phishnet_core::{PhishnetError, Result};
use phishnet_guard::RateLimitConfig;
use phishnet_scan::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "VT_API_KEY";

/// Detector settings, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Reputation service API key; falls back to `VT_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Reputation service base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Attachment scanning tunables
    #[serde(default)]
    pub scan: ScanConfig,

    /// Seconds stored reports are memoized
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Whether prediction requests are rate limited
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,

    /// Requests per client per window
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Rate limit window in seconds
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Cancel outstanding attachment scans after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_deadline_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            scan: ScanConfig::default(),
            cache_ttl_secs: default_cache_ttl(),
            rate_limit_enabled: true,
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window(),
            request_deadline_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| PhishnetError::io(path.display().to_string(), e))?;
            toml::from_str(&content).map_err(|e| PhishnetError::Configuration(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Configured API key, else `VT_API_KEY`. Blank keys count as absent.
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Limiter settings, or `None` when rate limiting is off
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        self.rate_limit_enabled.then(|| {
            RateLimitConfig::new(
                self.rate_limit_requests,
                Duration::from_secs(self.rate_limit_window_secs),
            )
        })
    }

    /// Report memoization lifetime
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Per-request scan deadline
    #[must_use]
    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }
}

// Default value functions for serde.
fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

const fn default_cache_ttl() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

const fn default_rate_limit_requests() -> u32 {
    100
}

const fn default_rate_limit_window() -> u64 {
    60
}
