//! Traits for the collaborators the scanner and detector depend on.
//!
//! All implementations must be `Send + Sync`: a single instance is shared by
//! every in-flight request.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{AnalysisPoll, Classification, Lookup, PredictionRecord};

/// Remote file-reputation service.
///
/// Each method is one network round trip with no local side effects and no
/// internal retries.
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Look a content hash up
    async fn lookup(&self, sha256: &str) -> Result<Lookup>;

    /// Upload a file for analysis, returning the analysis job id
    async fn submit(&self, content: &[u8], filename: &str) -> Result<String>;

    /// Poll an analysis job
    async fn poll_status(&self, job_id: &str) -> Result<AnalysisPoll>;
}

/// Text classifier, consumed as a black box
pub trait Classifier: Send + Sync {
    /// Classify email text
    fn classify(&self, text: &str) -> Result<Classification>;

    /// Whether the model is loaded and usable
    fn is_ready(&self) -> bool {
        true
    }
}

/// Persistent store of past predictions
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist a record, returning its id
    async fn save(&self, record: PredictionRecord) -> Result<String>;

    /// All records, newest first
    async fn find_all(&self) -> Result<Vec<PredictionRecord>>;

    /// A single record by id
    async fn find_by_id(&self, id: &str) -> Result<Option<PredictionRecord>>;
}

#[async_trait]
impl<T: PredictionStore + ?Sized> PredictionStore for Arc<T> {
    async fn save(&self, record: PredictionRecord) -> Result<String> {
        (**self).save(record).await
    }

    async fn find_all(&self) -> Result<Vec<PredictionRecord>> {
        (**self).find_all().await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PredictionRecord>> {
        (**self).find_by_id(id).await
    }
}
