//! In-memory key/value cache with per-entry time-to-live.
//!
//! Expiry is lazy: an expired entry is dropped the next time it is read.
//! Writes also sweep every expired entry once per default TTL, so keys that
//! are never read again do not accumulate. [`ResultCache::cleanup_expired`]
//! sweeps on demand. The map sits behind a
//! mutex that is never held across an `.await`, so a miss-compute-set
//! sequence can race and compute twice; the last write wins.

use parking_lot::Mutex;
use ring::digest::{digest, SHA256};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    last_sweep: Instant,
}

impl<V> Entries<V> {
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));
        self.last_sweep = now;
        before - self.map.len()
    }
}

/// Generic TTL cache keyed by string
pub struct ResultCache<V> {
    entries: Mutex<Entries<V>>,
    default_ttl: Duration,
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache whose entries live for `default_ttl` unless overridden
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            default_ttl,
        }
    }

    /// Lifetime applied when `set` is called without a TTL
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a live value, evicting the entry if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.map.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                trace!(key, "evicting expired entry");
                entries.map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value. `None` or a zero TTL falls back to the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let ttl = ttl.filter(|t| !t.is_zero()).unwrap_or(self.default_ttl);
        let mut entries = self.entries.lock();

        if now.duration_since(entries.last_sweep) >= self.default_ttl {
            let dropped = entries.sweep(now);
            if dropped > 0 {
                trace!(dropped, "swept expired entries");
            }
        }

        entries.map.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Remove an entry. Returns true if one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().map.remove(key).is_some()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.lock().map.clear();
    }

    /// Remove all expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        self.entries.lock().sweep(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map.is_empty()
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Errors are not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}

/// Derive a stable cache key from a namespace and a set of arguments.
///
/// Object keys are sorted before hashing so that argument order does not
/// matter.
#[must_use]
pub fn cache_key(namespace: &str, args: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(args, &mut canonical);
    let hash = digest(&SHA256, canonical.as_bytes());
    format!("{namespace}:{}", hex::encode(hash.as_ref()))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
