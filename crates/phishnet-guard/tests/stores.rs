use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use phishnet_core::{Label, PredictionRecord, PredictionStore, Result};
use phishnet_guard::{CachedStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn record(subject: &str, minute: u32) -> PredictionRecord {
    PredictionRecord {
        id: None,
        subject: subject.to_string(),
        body: "body".to_string(),
        prediction: Label::Ham,
        confidence: 0.9,
        spam_probability: 0.1,
        ham_probability: 0.9,
        attachments: vec![],
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap(),
    }
}

/// Counts reads that reach the underlying store
#[derive(Default)]
struct CountingStore {
    store: MemoryStore,
    find_all_calls: AtomicUsize,
    find_by_id_calls: AtomicUsize,
}

#[async_trait]
impl PredictionStore for CountingStore {
    async fn save(&self, record: PredictionRecord) -> Result<String> {
        self.store.save(record).await
    }

    async fn find_all(&self) -> Result<Vec<PredictionRecord>> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        self.store.find_all().await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PredictionRecord>> {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.store.find_by_id(id).await
    }
}

#[tokio::test]
async fn memory_store_orders_newest_first() {
    let store = MemoryStore::new();
    let first = store.save(record("older", 0)).await.unwrap();
    let second = store.save(record("newer", 5)).await.unwrap();
    store.save(record("same-time", 5)).await.unwrap();

    assert_ne!(first, second);

    let all = store.find_all().await.unwrap();
    let subjects: Vec<&str> = all.iter().map(|r| r.subject.as_str()).collect();
    assert_eq!(subjects, ["same-time", "newer", "older"]);

    let found = store.find_by_id(&first).await.unwrap().unwrap();
    assert_eq!(found.subject, "older");
    assert_eq!(found.id.as_deref(), Some(first.as_str()));
    assert!(store.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn cached_store_memoizes_find_all_until_save() {
    let cached = CachedStore::new(CountingStore::default(), Duration::from_secs(300));
    cached.save(record("one", 0)).await.unwrap();

    assert_eq!(cached.find_all().await.unwrap().len(), 1);
    assert_eq!(cached.find_all().await.unwrap().len(), 1);
    assert_eq!(cached.inner().find_all_calls.load(Ordering::SeqCst), 1);

    cached.save(record("two", 1)).await.unwrap();
    assert_eq!(cached.find_all().await.unwrap().len(), 2);
    assert_eq!(cached.inner().find_all_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cached_store_memoizes_find_by_id() {
    let cached = CachedStore::new(CountingStore::default(), Duration::from_secs(300));
    let id = cached.save(record("one", 0)).await.unwrap();

    for _ in 0..3 {
        let hit = cached.find_by_id(&id).await.unwrap();
        assert_eq!(hit.unwrap().subject, "one");
    }
    assert_eq!(cached.inner().find_by_id_calls.load(Ordering::SeqCst), 1);

    // misses are not cached
    assert!(cached.find_by_id("nope").await.unwrap().is_none());
    assert!(cached.find_by_id("nope").await.unwrap().is_none());
    assert_eq!(cached.inner().find_by_id_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn cached_store_entries_expire() {
    let cached = CachedStore::new(CountingStore::default(), Duration::from_secs(10));
    cached.find_all().await.unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    cached.find_all().await.unwrap();
    assert_eq!(cached.inner().find_all_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn record_key_is_deterministic() {
    let a = CachedStore::<MemoryStore>::record_key("42");
    let b = CachedStore::<MemoryStore>::record_key("42");
    assert_eq!(a, b);
    assert_ne!(a, CachedStore::<MemoryStore>::record_key("43"));
}
