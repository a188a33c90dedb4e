use serde::{Deserialize, Serialize};

use super::{AnalysisStats, ReputationReport};

/// Where a `Found` report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Served from the local report cache, no network call made
    Cache,
    /// The service already knew the hash; nothing was uploaded
    Existing,
    /// Uploaded, analyzed and re-fetched
    Analyzed,
}

/// Terminal state of one attachment scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A report is available
    Found {
        /// The report used for scoring
        report: ReputationReport,
        /// How it was obtained
        source: ReportSource,
    },
    /// Analysis did not complete within the polling budget
    TimedOut {
        /// Seconds spent polling
        elapsed_secs: u64,
    },
    /// A network error or malformed response aborted the scan
    Failed {
        /// Human-readable cause
        reason: String,
    },
    /// The parent request went away before the scan finished
    Cancelled,
    /// Scanning is switched off (no credentials)
    Disabled,
}

impl ScanOutcome {
    /// Normalized malicious score.
    ///
    /// Every non-`Found` state scores `0.0`, which means "no signal", not
    /// "benign".
    #[must_use]
    pub fn malicious_ratio(&self) -> f64 {
        match self {
            Self::Found { report, .. } => report.malicious_ratio(),
            _ => 0.0,
        }
    }

    /// Engine stats, zeroed when no report is available
    #[must_use]
    pub fn stats(&self) -> AnalysisStats {
        match self {
            Self::Found { report, .. } => report.stats,
            _ => AnalysisStats::default(),
        }
    }

    /// Short status label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::TimedOut { .. } => "timed_out",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::Disabled => "disabled",
        }
    }

    /// Returns true if the score carries real signal
    #[must_use]
    pub const fn has_signal(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Flat score block printed by the batch scanner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanScore {
    /// Engines flagging malicious
    pub malicious: u32,
    /// Engines flagging suspicious
    pub suspicious: u32,
    /// Engines reporting harmless
    pub harmless: u32,
    /// Engines with no detection
    pub undetected: u32,
    /// Sum of the four counts
    pub total_engines: u32,
    /// `(malicious + suspicious) / total_engines`
    pub malicious_ratio: f64,
}

impl From<&ScanOutcome> for ScanScore {
    fn from(outcome: &ScanOutcome) -> Self {
        let stats = outcome.stats();
        Self {
            malicious: stats.malicious,
            suspicious: stats.suspicious,
            harmless: stats.harmless,
            undetected: stats.undetected,
            total_engines: stats.total_engines(),
            malicious_ratio: outcome.malicious_ratio(),
        }
    }
}

/// Scan result for one attachment
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentScan {
    /// Attachment file name
    pub file: String,
    /// Content hash
    pub sha256: String,
    /// Terminal outcome
    pub outcome: ScanOutcome,
}

impl AttachmentScan {
    /// Flat score for output
    #[must_use]
    pub fn score(&self) -> ScanScore {
        ScanScore::from(&self.outcome)
    }
}

/// JSON line for one scanned file: `{file, sha256, status, score}`
impl Serialize for AttachmentScan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AttachmentScan", 4)?;
        state.serialize_field("file", &self.file)?;
        state.serialize_field("sha256", &self.sha256)?;
        state.serialize_field("status", self.outcome.label())?;
        state.serialize_field("score", &self.score())?;
        state.end()
    }
}
