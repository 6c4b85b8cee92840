// src/grid/service.rs
//! Contract of the backing collection service consumed by the fetch strategies,
//! the editing controller and bulk delete.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::definitions::{Criteria, Row, RowPatch};
use super::error::ServiceError;

/// One window (or the full set) of rows plus the number of rows matching the criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub rows: Vec<Row>,
    pub total_count: usize,
}

impl PageResult {
    pub fn new(rows: Vec<Row>, total_count: usize) -> Self {
        Self { rows, total_count }
    }
}

#[async_trait]
pub trait CollectionService: Send + Sync {
    /// Total rows matching `criteria`.
    async fn count(&self, criteria: &Criteria) -> Result<usize, ServiceError>;

    /// Rows `[start_row, end_row)` of the filtered, sorted collection.
    async fn get_page(
        &self,
        criteria: &Criteria,
        start_row: usize,
        end_row: usize,
    ) -> Result<PageResult, ServiceError>;

    async fn get_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError>;

    async fn update(&self, id: &str, patch: &RowPatch) -> Result<(), ServiceError>;

    async fn delete_many(&self, ids: &[String]) -> Result<(), ServiceError>;

    /// Cancels whatever this service instance has outstanding. The cancelled calls
    /// resolve with `ServiceError::Aborted`.
    fn abort(&self);
}
