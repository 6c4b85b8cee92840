// src/grid/fetch/paged.rs

use async_trait::async_trait;
use bevy::log::debug;
use std::sync::Arc;

use super::{PageRequest, RowModel, RowModelKind};
use crate::grid::definitions::Criteria;
use crate::grid::error::ServiceError;
use crate::grid::service::{CollectionService, PageResult};

/// Every window is a round-trip; the service filters and sorts.
pub struct PagedStrategy {
    service: Arc<dyn CollectionService>,
}

impl PagedStrategy {
    pub fn new(service: Arc<dyn CollectionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RowModel for PagedStrategy {
    fn kind(&self) -> RowModelKind {
        RowModelKind::Paged
    }

    async fn load_page(&self, request: &PageRequest) -> Result<PageResult, ServiceError> {
        debug!(
            "Paged load: rows {}..{} (append: {})",
            request.start_row(),
            request.end_row(),
            request.append
        );
        self.service
            .get_page(&request.criteria, request.start_row(), request.end_row())
            .await
    }

    async fn load_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError> {
        self.service.get_all(criteria).await
    }

    async fn count_matching(&self, criteria: &Criteria) -> Result<usize, ServiceError> {
        self.service.count(criteria).await
    }
}
