use serde::{Deserialize, Serialize};

/// Per-engine verdict counts from the reputation service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Engines flagging the file malicious
    #[serde(default)]
    pub malicious: u32,

    /// Engines flagging the file suspicious
    #[serde(default)]
    pub suspicious: u32,

    /// Engines reporting the file harmless
    #[serde(default)]
    pub harmless: u32,

    /// Engines with no detection
    #[serde(default)]
    pub undetected: u32,
}

impl AnalysisStats {
    /// Total number of engines that produced a verdict.
    ///
    /// Only the four verdict counts are summed. Engines reported as
    /// `timeout`, `failure` or `type-unsupported` gave no verdict and are
    /// left out of the denominator on purpose.
    #[must_use]
    pub const fn total_engines(&self) -> u32 {
        self.malicious
            .saturating_add(self.suspicious)
            .saturating_add(self.harmless)
            .saturating_add(self.undetected)
    }

    /// Fraction of engines flagging the file malicious or suspicious.
    ///
    /// Rounded to 4 decimal places, `0.0` when no engine answered.
    #[must_use]
    pub fn malicious_ratio(&self) -> f64 {
        let total = self.total_engines();
        if total == 0 {
            return 0.0;
        }
        let flagged = f64::from(self.malicious.saturating_add(self.suspicious));
        round4(flagged / f64::from(total))
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// The reputation service's verdict for one content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationReport {
    /// SHA-256 the report belongs to
    pub sha256: String,

    /// Aggregated engine verdicts from the last analysis
    pub stats: AnalysisStats,
}

impl ReputationReport {
    /// Create a report from a hash and its stats
    #[must_use]
    pub fn new(sha256: impl Into<String>, stats: AnalysisStats) -> Self {
        Self {
            sha256: sha256.into(),
            stats,
        }
    }

    /// Shortcut for [`AnalysisStats::malicious_ratio`]
    #[must_use]
    pub fn malicious_ratio(&self) -> f64 {
        self.stats.malicious_ratio()
    }
}

/// Result of looking a hash up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The service already knows this file
    Found(ReputationReport),
    /// The service has never seen this file
    NotFound,
}

/// Top-level `{"data": ...}` wrapper used by every response
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Wrapped object
    pub data: T,
}

/// `data` object returned by `GET /files/{sha256}`
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    /// Object identifier (the SHA-256 for files)
    #[serde(default)]
    pub id: Option<String>,

    /// File attributes
    pub attributes: FileAttributes,
}

/// Attributes of a file object; only the fields we consume
#[derive(Debug, Clone, Deserialize)]
pub struct FileAttributes {
    /// Engine verdict counts of the most recent analysis
    pub last_analysis_stats: AnalysisStats,
}
