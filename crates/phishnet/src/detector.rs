//! The prediction request flow.
//!
//! A [`Detector`] is built once at startup and shared by handle with every
//! request handler. It owns the classifier, the attachment scanner, the
//! memoized prediction store and the per-client rate limiter.

use chrono::Utc;
use phishnet_client::ReputationClient;
use phishnet_core::{
    AttachmentVerdict, Classifier, Email, PhishnetError, PredictionRecord, PredictionStore,
    Result,
};
use phishnet_guard::{Admission, CachedStore, MemoryStore, RateLimitConfig, RateLimiter};
use phishnet_scan::{ScanConfig, ScanOrchestrator, ScanRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::settings::Settings;

/// Path checked against the limiter for predictions
pub const PREDICT_PATH: &str = "/predict";

/// Liveness path, exempt from rate limiting by default
pub const HEALTH_PATH: &str = "/health";

/// Liveness report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    /// `healthy` when the classifier is usable, else `unhealthy`
    pub status: &'static str,
    /// Classifier readiness
    pub models_loaded: bool,
    /// Whether attachments are sent to the reputation service
    pub scanning_enabled: bool,
}

/// Email classifier with attachment reputation scanning
pub struct Detector {
    classifier: Arc<dyn Classifier>,
    scanner: ScanOrchestrator,
    store: CachedStore<Arc<dyn PredictionStore>>,
    limiter: Option<RateLimiter>,
    request_deadline: Option<Duration>,
}

impl Detector {
    /// Start building a detector around `classifier`
    pub fn builder(classifier: Arc<dyn Classifier>) -> DetectorBuilder {
        DetectorBuilder::new(classifier)
    }

    /// Wire a detector from settings.
    ///
    /// Without an API key the scanner is built disabled; a key that fails
    /// client construction is a configuration error.
    pub fn from_settings(settings: &Settings, classifier: Arc<dyn Classifier>) -> Result<Self> {
        let scanner = match settings.resolved_api_key() {
            Some(key) => {
                let mut client = ReputationClient::builder(key).base_url(&settings.base_url);
                if let Some(limit) = settings.scan.requests_per_minute {
                    client = client.requests_per_minute(limit);
                }
                ScanOrchestrator::new(Arc::new(client.build()?), settings.scan.clone())
            }
            None => ScanOrchestrator::disabled(settings.scan.clone()),
        };

        let mut builder = Self::builder(classifier)
            .scanner(scanner)
            .cache_ttl(settings.cache_ttl())
            .rate_limit(settings.rate_limit());
        if let Some(deadline) = settings.request_deadline() {
            builder = builder.request_deadline(deadline);
        }
        Ok(builder.build())
    }

    /// Classify an email and score its attachments.
    ///
    /// Only admission, validation and classification errors reach the
    /// caller. Attachment scans always finish with a score and a failed
    /// save only costs the record its id.
    #[instrument(skip_all, fields(client = %client_id, attachments = email.attachments.len()))]
    pub async fn predict(&self, client_id: &str, mut email: Email) -> Result<PredictionRecord> {
        if let Some(limiter) = &self.limiter {
            if let Admission::Rejected { retry_after } = limiter.check_path(PREDICT_PATH, client_id)
            {
                return Err(PhishnetError::RateLimited {
                    retry_after_secs: retry_after.as_secs(),
                });
            }
        }

        email.validate()?;
        let classification = self.classifier.classify(&email.classifier_text())?;
        debug!(label = %classification.label, confidence = classification.confidence(), "classified");

        let requests: Vec<ScanRequest> = email
            .attachments
            .iter()
            .map(ScanRequest::from_attachment)
            .collect();

        // cancels outstanding scans if this future is dropped
        let cancel = CancellationToken::new();
        let _abort = cancel.clone().drop_guard();

        let scans = {
            let scan = self.scanner.scan_all(&requests, &cancel);
            tokio::pin!(scan);
            match self.request_deadline {
                Some(deadline) => tokio::select! {
                    scans = &mut scan => scans,
                    () = tokio::time::sleep(deadline) => {
                        warn!(deadline_secs = deadline.as_secs(), "request deadline reached, cancelling scans");
                        cancel.cancel();
                        scan.await
                    }
                },
                None => scan.await,
            }
        };

        let mut record = PredictionRecord {
            id: None,
            subject: email.subject,
            body: email.body,
            prediction: classification.label,
            confidence: classification.confidence(),
            spam_probability: classification.spam_probability,
            ham_probability: classification.ham_probability,
            attachments: scans.iter().map(AttachmentVerdict::from).collect(),
            created_at: Utc::now(),
        };

        match self.store.save(record.clone()).await {
            Ok(id) => record.id = Some(id),
            Err(e) => warn!(error = %e, "failed to persist prediction"),
        }

        info!(
            id = record.id.as_deref().unwrap_or("-"),
            prediction = %record.prediction,
            max_attachment_ratio = record.max_attachment_ratio().unwrap_or(0.0),
            "prediction complete"
        );
        Ok(record)
    }

    /// Liveness report; never rate limited
    pub fn health(&self) -> Health {
        let models_loaded = self.classifier.is_ready();
        Health {
            status: if models_loaded { "healthy" } else { "unhealthy" },
            models_loaded,
            scanning_enabled: self.scanner.is_enabled(),
        }
    }

    /// All stored predictions, newest first
    pub async fn reports(&self) -> Result<Vec<PredictionRecord>> {
        self.store.find_all().await
    }

    /// One stored prediction
    pub async fn report(&self, id: &str) -> Result<Option<PredictionRecord>> {
        self.store.find_by_id(id).await
    }

    /// The attachment scanner
    pub const fn scanner(&self) -> &ScanOrchestrator {
        &self.scanner
    }

    /// The request limiter, if enabled
    pub const fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }
}

/// Builder for [`Detector`]
pub struct DetectorBuilder {
    classifier: Arc<dyn Classifier>,
    scanner: Option<ScanOrchestrator>,
    store: Option<Arc<dyn PredictionStore>>,
    rate_limit: Option<RateLimitConfig>,
    cache_ttl: Duration,
    request_deadline: Option<Duration>,
}

impl DetectorBuilder {
    /// Create a builder with an in-memory store, default rate limits and
    /// scanning disabled
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            scanner: None,
            store: None,
            rate_limit: Some(RateLimitConfig::default()),
            cache_ttl: phishnet_guard::DEFAULT_TTL,
            request_deadline: None,
        }
    }

    /// Use this scanner
    #[must_use]
    pub fn scanner(mut self, scanner: ScanOrchestrator) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Use this store instead of the in-memory one
    #[must_use]
    pub fn store(mut self, store: Arc<dyn PredictionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set or disable (`None`) rate limiting
    #[must_use]
    pub fn rate_limit(mut self, config: Option<RateLimitConfig>) -> Self {
        self.rate_limit = config;
        self
    }

    /// Set how long store reads are memoized
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Cancel scans still running after `deadline`
    #[must_use]
    pub const fn request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = Some(deadline);
        self
    }

    /// Build the detector
    pub fn build(self) -> Detector {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn PredictionStore>);

        Detector {
            classifier: self.classifier,
            scanner: self
                .scanner
                .unwrap_or_else(|| ScanOrchestrator::disabled(ScanConfig::default())),
            store: CachedStore::new(store, self.cache_ttl),
            limiter: self.rate_limit.map(RateLimiter::new),
            request_deadline: self.request_deadline,
        }
    }
}
