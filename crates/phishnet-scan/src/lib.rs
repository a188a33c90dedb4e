//! Asynchronous file-reputation scanning.
//!
//! For each attachment the [`ScanOrchestrator`] deduplicates by content hash,
//! skips uploads for hashes the service already knows, uploads unknown files,
//! polls the analysis job and turns the final report into a malicious score.
//! All service calls share one [`ConcurrencyGate`], and no failure ever
//! reaches the caller: failed, timed out or cancelled scans score `0.0`.
//!
//! # Example
//!
//! ```rust,ignore
//! use phishnet_scan::{ScanConfig, ScanOrchestrator, ScanRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = phishnet_client::ReputationClient::new("api-key")?;
//! let scanner = ScanOrchestrator::new(Arc::new(client), ScanConfig::default());
//! let request = ScanRequest::from_bytes("invoice.pdf", bytes);
//! let scan = scanner.scan(&request, &CancellationToken::new()).await;
//! println!("{}: {}", scan.file, scan.outcome.malicious_ratio());
//! ```

pub mod batch;
mod config;
mod gate;
mod orchestrator;
mod request;

pub use config::{ScanConfig, MIN_POLL_INTERVAL};
pub use gate::{ConcurrencyGate, GatePermit, DEFAULT_MAX_CONCURRENCY};
pub use orchestrator::ScanOrchestrator;
pub use request::{sha256_hex, ScanRequest};
pub use tokio_util::sync::CancellationToken;
