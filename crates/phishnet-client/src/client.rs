//! Reputation service client implementation.

use crate::api::{AnalysesApi, FilesApi};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use phishnet_core::{AnalysisPoll, Lookup, PhishnetError, ReputationService, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The public API v3 base URL
pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";

/// Header carrying the API key on every call
const API_KEY_HEADER: &str = "x-apikey";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Stateless adapter for the file-reputation service
#[derive(Clone)]
pub struct ReputationClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: String,
    quota: Option<DirectLimiter>,
}

impl ReputationClient {
    /// Create a new client with the given API key using default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ReputationClientBuilder::new(api_key).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> ReputationClientBuilder {
        ReputationClientBuilder::new(api_key)
    }

    /// Access file endpoints (lookup, upload)
    #[must_use]
    pub fn files(&self) -> FilesApi<'_> {
        FilesApi::new(self)
    }

    /// Access analysis endpoints (poll)
    #[must_use]
    pub fn analyses(&self) -> AnalysesApi<'_> {
        AnalysesApi::new(self)
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Perform a GET request, returning the raw response
    pub(crate) async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        debug!(url = %url, "GET request");
        self.send(self.inner.http.get(&url)).await
    }

    /// Perform a multipart POST request, returning the raw response
    pub(crate) async fn post_multipart(&self, path: &str, form: Form) -> Result<Response> {
        let url = self.url(path);
        debug!(url = %url, "POST multipart request");
        self.send(self.inner.http.post(&url).multipart(form)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        if let Some(quota) = &self.inner.quota {
            quota.until_ready().await;
        }

        request
            .send()
            .await
            .map_err(|e| PhishnetError::Http(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Read and decode a successful response body
    pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| PhishnetError::Http(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| PhishnetError::MalformedResponse(e.to_string()))
    }

    /// Convert an unexpected status into a network error carrying the body
    pub(crate) async fn status_error(response: Response) -> PhishnetError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status == 429 {
            warn!("Rate limited by reputation service");
        }

        PhishnetError::Network { status, body }
    }
}

#[async_trait]
impl ReputationService for ReputationClient {
    async fn lookup(&self, sha256: &str) -> Result<Lookup> {
        self.files().lookup(sha256).await
    }

    async fn submit(&self, content: &[u8], filename: &str) -> Result<String> {
        self.files().submit(content, filename).await
    }

    async fn poll_status(&self, job_id: &str) -> Result<AnalysisPoll> {
        self.analyses().status(job_id).await
    }
}

/// Builder for configuring a [`ReputationClient`]
pub struct ReputationClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    requests_per_minute: Option<u32>,
}

impl ReputationClientBuilder {
    /// Create a new builder with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("phishnet/{}", env!("CARGO_PKG_VERSION")),
            requests_per_minute: None,
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Cap outbound calls per minute (free-tier quotas). `0` disables the cap.
    #[must_use]
    pub const fn requests_per_minute(mut self, limit: u32) -> Self {
        self.requests_per_minute = Some(limit);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ReputationClient> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(PhishnetError::Configuration("API key is empty".into()));
        }

        let base = url::Url::parse(&self.base_url)
            .map_err(|e| PhishnetError::Configuration(format!("invalid base URL: {e}")))?;

        let mut key_value = HeaderValue::from_str(key)
            .map_err(|_| PhishnetError::Configuration("API key is not a valid header".into()))?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key_value);

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| PhishnetError::Http(e.to_string()))?;

        let quota = self
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|n| RateLimiter::direct(Quota::per_minute(n)));

        Ok(ReputationClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: base.as_str().trim_end_matches('/').to_string(),
                quota,
            }),
        })
    }
}
