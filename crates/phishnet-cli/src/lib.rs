//! # phishnet-cli
//!
//! Command-line front end for phishnet.
//!
//! ## Features
//!
//! - **Batch scanning**: score a file or every file in a directory against
//!   the reputation service, concurrently and within a polling budget
//! - **Configuration**: persistent API key and scan tunables in a TOML file
//! - **Output formats**: JSON (default, machine-readable) or colored text
//!
//! Logs go to stderr so stdout stays parseable.

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
