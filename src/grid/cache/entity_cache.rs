// src/grid/cache/entity_cache.rs
//! Keyed cache with an in-flight loading set.
//!
//! Concurrent `load` calls for one key share a single fetch. A failed fetch is
//! cached as `V::default()` so repeated UI triggers don't turn into a retry storm;
//! the key stays "known empty" until it is invalidated. An aborted fetch caches
//! nothing, so the next `load` asks the loader again.

use async_trait::async_trait;
use bevy::log::{debug, trace, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::grid::definitions::{Row, RowPatch};
use crate::grid::editing::RefreshHook;
use crate::grid::error::{GridError, GridResult, ServiceError};

/// Fetches the value for one key from wherever it lives.
#[async_trait]
pub trait EntityLoader<V>: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<V, ServiceError>;
}

/// Adapts an async closure into an `EntityLoader`.
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<V, F, Fut> EntityLoader<V> for FnLoader<F>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, ServiceError>> + Send,
{
    async fn fetch(&self, key: &str) -> Result<V, ServiceError> {
        (self.0)(key.to_string()).await
    }
}

pub type CacheErrorReporter = Arc<dyn Fn(&str, &ServiceError) + Send + Sync>;

struct InFlight<V> {
    id: u64,
    rx: watch::Receiver<Option<V>>,
}

struct CacheInner<V> {
    entries: HashMap<String, V>,
    loading: HashMap<String, InFlight<V>>,
    next_load_id: u64,
}

enum LoadRole<V> {
    Leader(u64, watch::Sender<Option<V>>),
    Follower(watch::Receiver<Option<V>>),
}

pub struct EntityCache<V> {
    name: &'static str,
    loader: Arc<dyn EntityLoader<V>>,
    inner: Mutex<CacheInner<V>>,
    on_error: Option<CacheErrorReporter>,
}

/// Clears a key's loading mark if its leader is dropped before finishing.
struct LoadingMark<'a, V> {
    inner: &'a Mutex<CacheInner<V>>,
    key: &'a str,
    id: u64,
}

impl<V> Drop for LoadingMark<'_, V> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.loading.get(self.key).is_some_and(|f| f.id == self.id) {
            inner.loading.remove(self.key);
        }
    }
}

impl<V> EntityCache<V>
where
    V: Clone + Default + Send + Sync + 'static,
{
    pub fn new(name: &'static str, loader: Arc<dyn EntityLoader<V>>) -> Self {
        Self {
            name,
            loader,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                loading: HashMap::new(),
                next_load_id: 0,
            }),
            on_error: None,
        }
    }

    /// Routes swallowed fetch errors to the caller's error channel as well as the log.
    pub fn with_error_reporter(mut self, reporter: CacheErrorReporter) -> Self {
        self.on_error = Some(reporter);
        self
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.inner.lock().loading.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value, joins an in-flight load, or fetches.
    ///
    /// Only malformed keys fail; fetch errors resolve to the neutral value.
    pub async fn load(&self, key: &str) -> GridResult<V> {
        validate_key(key)?;

        let role = {
            let mut inner = self.inner.lock();
            if let Some(v) = inner.entries.get(key) {
                return Ok(v.clone());
            }
            if let Some(in_flight) = inner.loading.get(key) {
                LoadRole::Follower(in_flight.rx.clone())
            } else {
                let id = inner.next_load_id;
                inner.next_load_id += 1;
                let (tx, rx) = watch::channel(None);
                inner.loading.insert(key.to_string(), InFlight { id, rx });
                LoadRole::Leader(id, tx)
            }
        };

        match role {
            LoadRole::Follower(mut rx) => {
                trace!("{}: joining in-flight load for '{}'", self.name, key);
                let joined = rx.wait_for(Option::is_some).await.map(|v| (*v).clone());
                match joined {
                    Ok(Some(v)) => Ok(v),
                    // Leader went away without a result; hand back the best known value.
                    _ => Ok(self.get(key).unwrap_or_default()),
                }
            }
            LoadRole::Leader(id, tx) => {
                let _mark = LoadingMark {
                    inner: &self.inner,
                    key,
                    id,
                };
                let value = match self.loader.fetch(key).await {
                    Ok(v) => v,
                    Err(ServiceError::Aborted) => {
                        debug!("{}: load for '{}' aborted, nothing cached", self.name, key);
                        self.inner.lock().loading.remove(key);
                        // Dropping the sender releases followers with the best known value.
                        drop(tx);
                        return Ok(self.get(key).unwrap_or_default());
                    }
                    Err(err) => {
                        warn!(
                            "{}: load for '{}' failed, caching empty value: {}",
                            self.name, key, err
                        );
                        if let Some(report) = &self.on_error {
                            report(key, &err);
                        }
                        V::default()
                    }
                };
                {
                    let mut inner = self.inner.lock();
                    inner.entries.insert(key.to_string(), value.clone());
                    inner.loading.remove(key);
                }
                let _ = tx.send(Some(value.clone()));
                Ok(value)
            }
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.lock().entries.insert(key.into(), value);
    }

    /// Mutates a cached value in place. Returns false if the key isn't materialized.
    pub fn update(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
        match self.inner.lock().entries.get_mut(key) {
            Some(v) => {
                f(v);
                true
            }
            None => false,
        }
    }

    /// Forgets a key so the next `load` fetches again.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

fn validate_key(key: &str) -> GridResult<()> {
    if key.trim().is_empty() || key.chars().any(char::is_control) {
        return Err(GridError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// The row detail cache follows committed edits and deletions of the grid it is attached to.
impl RefreshHook for EntityCache<Option<Row>> {
    fn row_updated(&self, row_id: &str, patch: &RowPatch) {
        self.update(row_id, |cached| {
            if let Some(row) = cached {
                row.apply_patch(patch);
            }
        });
    }

    fn rows_removed(&self, ids: &[String]) {
        for id in ids {
            self.insert(id.clone(), None);
        }
    }
}
