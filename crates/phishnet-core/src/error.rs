use thiserror::Error;

/// Result type alias for phishnet operations
pub type Result<T> = std::result::Result<T, PhishnetError>;

/// Errors that can occur while classifying mail or scanning attachments
#[derive(Error, Debug)]
pub enum PhishnetError {
    /// Missing or invalid credentials/settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The reputation service answered with a non-success status
    #[error("reputation service returned {status}: {body}")]
    Network {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// HTTP request failed before a status was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Analysis did not complete within the polling budget
    #[error("analysis timed out after {elapsed_secs} seconds")]
    Timeout {
        /// Seconds spent polling
        elapsed_secs: u64,
    },

    /// Payload did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Rejected request input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Admission control rejected the request
    #[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after_secs: u64,
    },

    /// Classifier failed to produce a verdict
    #[error("classification failed: {0}")]
    Classification(String),

    /// Persistence layer failure
    #[error("storage error: {0}")]
    Storage(String),

    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PhishnetError {
    /// Build an [`PhishnetError::Io`] for the given path
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for failures talking to the reputation service.
    ///
    /// Malformed payloads count as network failures.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Http(_) | Self::MalformedResponse(_)
        )
    }

    /// Returns the HTTP status code if the service answered with one
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}
