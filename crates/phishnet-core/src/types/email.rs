use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AttachmentScan;
use crate::error::{PhishnetError, Result};

/// Classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Spam or phishing
    Spam,
    /// Legitimate mail
    Ham,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spam => write!(f, "spam"),
            Self::Ham => write!(f, "ham"),
        }
    }
}

/// Output of the text classifier. Probabilities sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Predicted label
    pub label: Label,
    /// Probability the text is legitimate
    pub ham_probability: f64,
    /// Probability the text is spam
    pub spam_probability: f64,
}

impl Classification {
    /// Probability of the predicted label
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        match self.label {
            Label::Spam => self.spam_probability,
            Label::Ham => self.ham_probability,
        }
    }
}

/// A raw attachment as received with the email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name
    pub filename: String,
    /// File content
    pub content: Vec<u8>,
}

impl Attachment {
    /// Create an attachment
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// An email submitted for prediction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    /// Subject line
    pub subject: String,
    /// Body text
    pub body: String,
    /// Attached files
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create an email without attachments
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    /// Add an attachment
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Trim subject and body, rejecting blank ones
    pub fn validate(&mut self) -> Result<()> {
        for (name, field) in [("subject", &mut self.subject), ("body", &mut self.body)] {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                return Err(PhishnetError::InvalidInput(format!(
                    "{name} cannot be empty or whitespace only"
                )));
            }
            *field = trimmed.to_string();
        }
        Ok(())
    }

    /// Text fed to the classifier
    #[must_use]
    pub fn classifier_text(&self) -> String {
        format!("{} {}", self.subject, self.body).trim().to_string()
    }
}

/// Stored per-attachment verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentVerdict {
    /// Attachment file name
    pub filename: String,
    /// Content hash
    pub sha256: String,
    /// Terminal scan status label
    pub status: String,
    /// Malicious ratio, `0.0` when no signal
    pub malicious_ratio: f64,
}

impl From<&AttachmentScan> for AttachmentVerdict {
    fn from(scan: &AttachmentScan) -> Self {
        Self {
            filename: scan.file.clone(),
            sha256: scan.sha256.clone(),
            status: scan.outcome.label().to_string(),
            malicious_ratio: scan.outcome.malicious_ratio(),
        }
    }
}

/// A persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Store-assigned identifier, absent until saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Trimmed subject
    pub subject: String,
    /// Trimmed body
    pub body: String,
    /// Classifier verdict
    pub prediction: Label,
    /// Probability of the predicted label
    pub confidence: f64,
    /// Probability of spam
    pub spam_probability: f64,
    /// Probability of ham
    pub ham_probability: f64,
    /// Attachment scan verdicts
    #[serde(default)]
    pub attachments: Vec<AttachmentVerdict>,
    /// When the prediction was made
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Highest malicious ratio across attachments, if any were scanned
    #[must_use]
    pub fn max_attachment_ratio(&self) -> Option<f64> {
        self.attachments
            .iter()
            .map(|a| a.malicious_ratio)
            .reduce(f64::max)
    }
}
