//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use phishnet::{AttachmentScan, ScanOutcome};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array, one element per file
    #[default]
    Json,
    /// Colored one-line summary per file
    Pretty,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: json, pretty",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

/// Print scan results to stdout.
pub fn print_scans(scans: &[AttachmentScan], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(scans)?),
        OutputFormat::Pretty => {
            for scan in scans {
                println!("{}", pretty_line(scan));
            }
        }
    }
    Ok(())
}

fn pretty_line(scan: &AttachmentScan) -> String {
    let score = scan.score();
    format!(
        "{:<10} {:>7.2}%  {}/{} engines  {}  {}",
        status_label(&scan.outcome),
        score.malicious_ratio * 100.0,
        score.malicious + score.suspicious,
        score.total_engines,
        &scan.sha256[..12.min(scan.sha256.len())],
        scan.file.bold()
    )
}

fn status_label(outcome: &ScanOutcome) -> ColoredString {
    let label = outcome.label();
    match outcome {
        ScanOutcome::Found { .. } if outcome.malicious_ratio() > 0.0 => label.red().bold(),
        ScanOutcome::Found { .. } => label.green(),
        ScanOutcome::TimedOut { .. } | ScanOutcome::Failed { .. } => label.yellow(),
        ScanOutcome::Cancelled | ScanOutcome::Disabled => label.dimmed(),
    }
}
