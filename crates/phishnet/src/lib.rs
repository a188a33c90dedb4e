//! Email spam classification with asynchronous attachment reputation
//! scanning.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use phishnet::{Detector, Email, Attachment, Settings};
//!
//! #[tokio::main]
//! async fn main() -> phishnet::Result<()> {
//!     let settings = Settings::load("phishnet.toml".as_ref())?;
//!     let detector = Detector::from_settings(&settings, Arc::new(MyModel::load()?))?;
//!
//!     let email = Email::new("Invoice overdue", "Please open the attached file")
//!         .with_attachment(Attachment::new("invoice.pdf", bytes));
//!     let record = detector.predict("203.0.113.7", email).await?;
//!
//!     println!("{} ({:.2})", record.prediction, record.confidence);
//!     for verdict in &record.attachments {
//!         println!("  {} {} {:.4}", verdict.filename, verdict.status, verdict.malicious_ratio);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

mod detector;
mod settings;

pub use detector::{Detector, DetectorBuilder, Health, HEALTH_PATH, PREDICT_PATH};
pub use settings::{Settings, API_KEY_ENV};

// Re-export core types
pub use phishnet_core::*;

// Re-export building blocks
pub use phishnet_client::{ReputationClient, ReputationClientBuilder, DEFAULT_BASE_URL};
pub use phishnet_guard::{
    cache_key, Admission, CachedStore, MemoryStore, RateLimitConfig, RateLimiter, ResultCache,
};
pub use phishnet_scan::{
    batch, CancellationToken, ConcurrencyGate, ScanConfig, ScanOrchestrator, ScanRequest,
};

// Re-export runtime for convenience
pub use serde_json;
pub use tokio;
