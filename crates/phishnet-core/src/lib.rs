//! Core types and traits for phishnet.
//!
//! This crate provides the foundational pieces shared by every other crate:
//!
//! - **Types**: reputation reports, analysis jobs, scan outcomes, emails and
//!   prediction records
//! - **Errors**: one error enum, [`PhishnetError`]
//! - **Capabilities**: the [`ReputationService`], [`Classifier`] and
//!   [`PredictionStore`] seams
//!
//! # Example
//!
//! ```rust
//! use phishnet_core::AnalysisStats;
//!
//! let stats = AnalysisStats { malicious: 3, suspicious: 1, harmless: 10, undetected: 6 };
//! assert_eq!(stats.total_engines(), 20);
//! assert!((stats.malicious_ratio() - 0.2).abs() < f64::EPSILON);
//! ```

mod capability;
mod error;
pub mod types;

pub use capability::{Classifier, PredictionStore, ReputationService};
pub use error::{PhishnetError, Result};
pub use types::*;
