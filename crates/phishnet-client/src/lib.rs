//! HTTP client for the file-reputation service.
//!
//! [`ReputationClient`] wraps the three calls the scanner needs:
//! `GET /files/{sha256}`, `POST /files` and `GET /analyses/{id}`. It performs
//! no retries; retry and polling policy belong to the caller.

mod client;
pub mod api;

pub use client::{ReputationClient, ReputationClientBuilder, DEFAULT_BASE_URL};
pub use phishnet_core::{PhishnetError, Result};
