//! Shared-state primitives used across requests.
//!
//! - [`ResultCache`]: string-keyed TTL cache with lazy expiry
//! - [`RateLimiter`]: per-client sliding-window admission control
//! - [`MemoryStore`] / [`CachedStore`]: prediction persistence and read
//!   memoization
//!
//! Every type here is meant to be built once at startup and shared by
//! handle (`Arc`) with request handlers.

pub mod cache;
pub mod rate_limit;
pub mod store;

pub use cache::{cache_key, ResultCache, DEFAULT_TTL};
pub use rate_limit::{Admission, RateLimitConfig, RateLimiter};
pub use store::{CachedStore, MemoryStore, ALL_REPORTS_KEY};
