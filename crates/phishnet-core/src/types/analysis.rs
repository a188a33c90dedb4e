use serde::{Deserialize, Serialize};

/// Progress of a remote analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Queued or still running on the service
    Pending,
    /// Analysis finished; a fresh report is available
    Completed,
}

impl AnalysisStatus {
    /// Map the wire status string.
    ///
    /// Only `"completed"` finishes a job; `"queued"`, `"in-progress"` and
    /// anything unrecognised keep polling.
    #[must_use]
    pub fn from_wire(status: &str) -> Self {
        if status.eq_ignore_ascii_case("completed") {
            Self::Completed
        } else {
            Self::Pending
        }
    }

    /// Returns true once polling can stop
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// An analysis job handed back by an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    /// Job identifier used for polling
    pub id: String,
    /// Last observed status
    pub status: AnalysisStatus,
}

impl AnalysisJob {
    /// A freshly submitted job
    #[must_use]
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: AnalysisStatus::Pending,
        }
    }

    /// Record a poll result. Completion is sticky.
    pub fn observe(&mut self, status: AnalysisStatus) {
        if !self.status.is_completed() {
            self.status = status;
        }
    }
}

/// One poll of an analysis job
#[derive(Debug, Clone)]
pub struct AnalysisPoll {
    /// Normalized status
    pub status: AnalysisStatus,
    /// Full response payload as returned by the service
    pub raw_report: serde_json::Value,
}

/// `data` object returned by `GET /analyses/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisObject {
    /// Analysis identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Analysis attributes
    pub attributes: AnalysisAttributes,
}

/// Attributes of an analysis object
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisAttributes {
    /// Raw status string
    pub status: String,
}

/// `data` object returned by `POST /files`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadObject {
    /// Analysis job identifier
    pub id: String,

    /// Object type, `"analysis"` in practice
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}
