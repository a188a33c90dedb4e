//! Prediction stores: an in-process store and a memoizing wrapper.

use async_trait::async_trait;
use parking_lot::Mutex;
use phishnet_core::{PredictionRecord, PredictionStore, Result};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::{cache_key, ResultCache};

/// Fixed key for the "all reports" query
pub const ALL_REPORTS_KEY: &str = "reports:all";

/// In-memory [`PredictionStore`] with sequential ids
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PredictionRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn save(&self, mut record: PredictionRecord) -> Result<String> {
        let mut records = self.records.lock();
        let id = (records.len() + 1).to_string();
        record.id = Some(id.clone());
        records.push(record);
        info!(id = %id, "prediction saved");
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<PredictionRecord>> {
        let mut all: Vec<PredictionRecord> = self.records.lock().iter().rev().cloned().collect();
        // stable: equal timestamps keep newest-inserted first
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PredictionRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned())
    }
}

/// Memoizes reads of another store.
///
/// `find_all` is cached under [`ALL_REPORTS_KEY`]; `find_by_id` under a key
/// derived from the id. `save` invalidates the "all" entry.
pub struct CachedStore<S> {
    inner: S,
    reports: ResultCache<Vec<PredictionRecord>>,
    records: ResultCache<PredictionRecord>,
}

impl<S: PredictionStore> CachedStore<S> {
    /// Wrap `inner`, caching reads for `ttl`
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            reports: ResultCache::new(ttl),
            records: ResultCache::new(ttl),
        }
    }

    /// Key used for a by-id lookup
    #[must_use]
    pub fn record_key(id: &str) -> String {
        cache_key("report", &json!({ "id": id }))
    }

    /// Drop every memoized read
    pub fn invalidate(&self) {
        self.reports.clear();
        self.records.clear();
    }

    /// The wrapped store
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PredictionStore> PredictionStore for CachedStore<S> {
    async fn save(&self, record: PredictionRecord) -> Result<String> {
        let id = self.inner.save(record).await?;
        self.reports.delete(ALL_REPORTS_KEY);
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<PredictionRecord>> {
        self.reports
            .get_or_try_insert_with(ALL_REPORTS_KEY, None, || self.inner.find_all())
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PredictionRecord>> {
        let key = Self::record_key(id);
        if let Some(hit) = self.records.get(&key) {
            debug!(id, "report served from cache");
            return Ok(Some(hit));
        }

        let found = self.inner.find_by_id(id).await?;
        if let Some(record) = &found {
            self.records.set(key, record.clone(), None);
        }
        Ok(found)
    }
}
