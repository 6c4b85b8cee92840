// tests/entity_cache.rs
// De-duplication, empty-value caching and abort handling of the keyed loader cache.

use async_trait::async_trait;
use gridwind::grid::cache::{EntityCache, EntityLoader, FnLoader};
use gridwind::grid::{GridError, ServiceError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts calls and parks each fetch until `gate` is notified.
struct GatedLoader {
    calls: Arc<AtomicUsize>,
    gate: Arc<Notify>,
}

#[async_trait]
impl EntityLoader<String> for GatedLoader {
    async fn fetch(&self, key: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(format!("body of {}", key))
    }
}

fn gated_loader(calls: Arc<AtomicUsize>, gate: Arc<Notify>) -> Arc<GatedLoader> {
    Arc::new(GatedLoader { calls, gate })
}

#[tokio::test]
async fn concurrent_loads_of_one_key_share_a_single_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let cache: EntityCache<String> =
        EntityCache::new("message_bodies", gated_loader(Arc::clone(&calls), Arc::clone(&gate)));

    let release = async {
        tokio::task::yield_now().await;
        gate.notify_one();
    };
    let (first, second, ()) = tokio::join!(cache.load("m1"), cache.load("m1"), release);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.unwrap(), "body of m1");
    assert_eq!(second.unwrap(), "body of m1");
    assert!(!cache.is_loading("m1"));
    assert_eq!(cache.get("m1").as_deref(), Some("body of m1"));
}

#[tokio::test]
async fn different_keys_fetch_independently() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let cache: EntityCache<String> =
        EntityCache::new("message_headers", gated_loader(Arc::clone(&calls), Arc::clone(&gate)));

    let release = async {
        tokio::task::yield_now().await;
        gate.notify_one();
        gate.notify_one();
    };
    let (a, b, ()) = tokio::join!(cache.load("a"), cache.load("b"), release);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.unwrap(), "body of a");
    assert_eq!(b.unwrap(), "body of b");
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn failed_fetch_caches_empty_value_until_invalidated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let reported = Arc::new(Mutex::new(Vec::<String>::new()));
    let counter = Arc::clone(&calls);
    let loader = Arc::new(FnLoader(move |_key: String| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Vec<String>, _>(ServiceError::Backend("503".into()))
        }
    }));
    let sink = Arc::clone(&reported);
    let cache: EntityCache<Vec<String>> = EntityCache::new("thread_headers", loader)
        .with_error_reporter(Arc::new(move |key: &str, _e: &ServiceError| {
            sink.lock().push(key.to_string());
        }));

    assert_eq!(cache.load("t1").await.unwrap(), Vec::<String>::new());
    assert_eq!(cache.load("t1").await.unwrap(), Vec::<String>::new());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get("t1"), Some(vec![]));
    assert_eq!(*reported.lock(), vec!["t1".to_string()]);

    assert!(cache.invalidate("t1"));
    cache.load("t1").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn blank_keys_fail_without_fetching() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let cache: EntityCache<String> =
        EntityCache::new("message_bodies", gated_loader(Arc::clone(&calls), gate));

    assert!(matches!(cache.load("   ").await, Err(GridError::InvalidKey(_))));
    assert!(matches!(cache.load("").await, Err(GridError::InvalidKey(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn aborted_fetch_is_not_cached_and_the_next_load_refetches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let reported = Arc::new(Mutex::new(Vec::<String>::new()));
    let counter = Arc::clone(&calls);
    let loader = Arc::new(FnLoader(move |key: String| {
        let counter = Arc::clone(&counter);
        async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err(ServiceError::Aborted),
                _ => Ok(format!("body of {}", key)),
            }
        }
    }));
    let sink = Arc::clone(&reported);
    let cache: EntityCache<String> = EntityCache::new("message_bodies", loader)
        .with_error_reporter(Arc::new(move |key: &str, _e: &ServiceError| {
            sink.lock().push(key.to_string());
        }));

    assert_eq!(cache.load("m1").await.unwrap(), "");
    assert_eq!(cache.get("m1"), None);
    assert!(!cache.is_loading("m1"));
    assert!(reported.lock().is_empty());

    assert_eq!(cache.load("m1").await.unwrap(), "body of m1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get("m1").as_deref(), Some("body of m1"));
}
