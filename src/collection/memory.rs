// src/collection/memory.rs
//! `CollectionService` over an in-process `Vec<Row>`.

use async_trait::async_trait;
use bevy::log::{debug, info};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::grid::cache::EntityLoader;
use crate::grid::definitions::{Criteria, Row, RowPatch};
use crate::grid::error::ServiceError;
use crate::grid::service::{CollectionService, PageResult};

#[derive(Debug, Default)]
pub struct MemoryCollection {
    rows: RwLock<Vec<Row>>,
    get_all_calls: AtomicUsize,
    get_page_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryCollection {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: RwLock::new(rows),
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_all_calls(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    pub fn get_page_calls(&self) -> usize {
        self.get_page_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Makes every following `update` fail with a backend error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CollectionService for MemoryCollection {
    async fn count(&self, criteria: &Criteria) -> Result<usize, ServiceError> {
        Ok(self.rows.read().iter().filter(|r| criteria.matches(r)).count())
    }

    async fn get_page(
        &self,
        criteria: &Criteria,
        start_row: usize,
        end_row: usize,
    ) -> Result<PageResult, ServiceError> {
        self.get_page_calls.fetch_add(1, Ordering::SeqCst);
        let matching = criteria.apply(self.rows.read().iter());
        let total = matching.len();
        let start = start_row.min(total);
        let end = end_row.clamp(start, total);
        debug!("MemoryCollection: page {}..{} of {}", start, end, total);
        Ok(PageResult::new(matching[start..end].to_vec(), total))
    }

    async fn get_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        let matching = criteria.apply(self.rows.read().iter());
        let total = matching.len();
        Ok(PageResult::new(matching, total))
    }

    async fn update(&self, id: &str, patch: &RowPatch) -> Result<(), ServiceError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("update rejected".into()));
        }
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        row.apply_patch(patch);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), ServiceError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Backend("delete rejected".into()));
        }
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !ids.contains(&r.id));
        info!("MemoryCollection: deleted {} row(s)", before - rows.len());
        Ok(())
    }

    fn abort(&self) {
        // Every call completes synchronously; there is never anything to cancel.
        debug!("MemoryCollection: abort requested");
    }
}

/// Row lookup for the detail cache.
#[async_trait]
impl EntityLoader<Option<Row>> for MemoryCollection {
    async fn fetch(&self, key: &str) -> Result<Option<Row>, ServiceError> {
        Ok(self.rows.read().iter().find(|r| r.id == key).cloned())
    }
}
