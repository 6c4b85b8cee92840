// src/grid/fetch/mod.rs
//! Row models: full-set vs. paged, chosen once per grid.

pub mod full_set;
pub mod guard;
pub mod paged;

use async_trait::async_trait;
use bevy::log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::grid::definitions::{Criteria, RowPatch};
use crate::grid::error::ServiceError;
use crate::grid::service::{CollectionService, PageResult};

pub use full_set::FullSetStrategy;
pub use guard::{FetchGuard, FetchTicket};
pub use paged::PagedStrategy;

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub index: usize,
    pub page_size: usize,
    /// Extend the current collection instead of replacing it.
    pub append: bool,
    pub criteria: Criteria,
}

impl PageRequest {
    pub fn first(page_size: usize, criteria: Criteria) -> Self {
        Self {
            index: 0,
            page_size,
            append: false,
            criteria,
        }
    }

    pub fn start_row(&self) -> usize {
        self.index * self.page_size
    }

    pub fn end_row(&self) -> usize {
        self.start_row() + self.page_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowModelKind {
    FullSet,
    Paged,
}

/// Uniform load contract regardless of where filtering happens.
#[async_trait]
pub trait RowModel: Send + Sync {
    fn kind(&self) -> RowModelKind;

    async fn load_page(&self, request: &PageRequest) -> Result<PageResult, ServiceError>;

    async fn load_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError>;

    async fn count_matching(&self, criteria: &Criteria) -> Result<usize, ServiceError>;

    /// Keeps locally held copies in step with a committed edit.
    fn apply_patch(&self, _row_id: &str, _patch: &RowPatch) {}

    /// Drops deleted rows from locally held copies.
    fn forget(&self, _ids: &[String]) {}

    /// Discards locally held copies so the next load goes back to the service.
    fn invalidate(&self) {}
}

/// Measures the collection once and picks the row model for the grid's lifetime.
pub async fn select_row_model(
    service: Arc<dyn CollectionService>,
    criteria: &Criteria,
    full_set_threshold: usize,
) -> Result<Arc<dyn RowModel>, ServiceError> {
    let total = service.count(criteria).await?;
    let model: Arc<dyn RowModel> = if total < full_set_threshold {
        Arc::new(FullSetStrategy::new(service, criteria))
    } else {
        Arc::new(PagedStrategy::new(service))
    };
    info!(
        "Row model selected: {:?} ({} rows, threshold {})",
        model.kind(),
        total,
        full_set_threshold
    );
    Ok(model)
}
