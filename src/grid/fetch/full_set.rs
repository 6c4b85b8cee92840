// src/grid/fetch/full_set.rs

use async_trait::async_trait;
use bevy::log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{PageRequest, RowModel, RowModelKind};
use crate::grid::definitions::{Criteria, Row, RowPatch};
use crate::grid::error::ServiceError;
use crate::grid::service::{CollectionService, PageResult};

/// Rows fetched by one `get_all`, with the criteria they were fetched under.
struct HeldSet {
    scope: Criteria,
    rows: Arc<Vec<Row>>,
}

/// Loads the matching set once, then filters, sorts, pages and counts in memory.
///
/// The set is fetched under the criteria the model was selected with. Later
/// criteria that only narrow it are served locally; criteria that widen it
/// fetch again.
pub struct FullSetStrategy {
    service: Arc<dyn CollectionService>,
    base: Criteria,
    held: RwLock<Option<HeldSet>>,
    // Serializes `get_all` so concurrent first loads share it.
    fetch_lock: Mutex<()>,
}

impl FullSetStrategy {
    pub fn new(service: Arc<dyn CollectionService>, base: &Criteria) -> Self {
        Self {
            service,
            base: base.without_sort(),
            held: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.held.read().is_some()
    }

    fn held_covering(&self, criteria: &Criteria) -> Option<Arc<Vec<Row>>> {
        self.held
            .read()
            .as_ref()
            .filter(|held| criteria.is_within(&held.scope))
            .map(|held| Arc::clone(&held.rows))
    }

    async fn rows_for(&self, criteria: &Criteria) -> Result<Arc<Vec<Row>>, ServiceError> {
        if let Some(rows) = self.held_covering(criteria) {
            return Ok(rows);
        }

        let _fetch = self.fetch_lock.lock().await;
        if let Some(rows) = self.held_covering(criteria) {
            return Ok(rows);
        }

        let scope = if criteria.is_within(&self.base) {
            self.base.clone()
        } else {
            debug!("Criteria widen the held set; fetching it again");
            criteria.without_sort()
        };
        let all = self.service.get_all(&scope).await?;
        info!("Full-set load complete: {} rows held in memory", all.rows.len());
        let rows = Arc::new(all.rows);
        *self.held.write() = Some(HeldSet {
            scope,
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }
}

#[async_trait]
impl RowModel for FullSetStrategy {
    fn kind(&self) -> RowModelKind {
        RowModelKind::FullSet
    }

    async fn load_page(&self, request: &PageRequest) -> Result<PageResult, ServiceError> {
        let rows = self.rows_for(&request.criteria).await?;
        let matching = request.criteria.apply(rows.iter());
        let total = matching.len();
        let start = request.start_row().min(total);
        let end = request.end_row().min(total);
        debug!(
            "Full-set page {}: rows {}..{} of {} matching",
            request.index, start, end, total
        );
        let page = matching
            .into_iter()
            .skip(start)
            .take(end - start)
            .collect();
        Ok(PageResult::new(page, total))
    }

    async fn load_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError> {
        let rows = self.rows_for(criteria).await?;
        let matching = criteria.apply(rows.iter());
        let total = matching.len();
        Ok(PageResult::new(matching, total))
    }

    async fn count_matching(&self, criteria: &Criteria) -> Result<usize, ServiceError> {
        let rows = self.rows_for(criteria).await?;
        Ok(rows.iter().filter(|row| criteria.matches(row)).count())
    }

    fn apply_patch(&self, row_id: &str, patch: &RowPatch) {
        if let Some(held) = self.held.write().as_mut() {
            if let Some(row) = Arc::make_mut(&mut held.rows).iter_mut().find(|r| r.id == row_id) {
                row.apply_patch(patch);
            }
        }
    }

    fn forget(&self, ids: &[String]) {
        if let Some(held) = self.held.write().as_mut() {
            Arc::make_mut(&mut held.rows).retain(|r| !ids.contains(&r.id));
        }
    }

    fn invalidate(&self) {
        *self.held.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::memory::MemoryCollection;
    use crate::grid::definitions::{single_field_patch, ColumnFilter, FilterOperator, SortSpec};
    use serde_json::json;

    fn people() -> Arc<MemoryCollection> {
        Arc::new(MemoryCollection::new(vec![
            Row::new("1").with_field("name", "Carla").with_field("city", "Lyon"),
            Row::new("2").with_field("name", "Ana").with_field("city", "Paris"),
            Row::new("3").with_field("name", "Bruno").with_field("city", "Lyon"),
        ]))
    }

    #[tokio::test]
    async fn pages_are_filtered_and_sorted_locally() {
        let service = people();
        let model = FullSetStrategy::new(service.clone(), &Criteria::default());
        let criteria = Criteria::default()
            .with_filter("city", ColumnFilter::new(FilterOperator::Equals, "lyon"))
            .with_sort(SortSpec::asc("name"));

        let page = model
            .load_page(&PageRequest::first(1, criteria.clone()))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.rows[0].id, "3");
        assert_eq!(model.count_matching(&criteria).await.unwrap(), 2);
        assert_eq!(service.get_all_calls(), 1);
    }

    #[tokio::test]
    async fn patches_and_deletes_reach_the_snapshot() {
        let model = FullSetStrategy::new(people(), &Criteria::default());
        model.load_all(&Criteria::default()).await.unwrap();

        model.apply_patch("2", &single_field_patch("name", json!("Zoe")));
        model.forget(&["1".to_string()]);

        let all = model
            .load_all(&Criteria::default().with_sort(SortSpec::asc("name")))
            .await
            .unwrap();
        let names: Vec<_> = all.rows.iter().map(|r| r.field("name").cloned()).collect();
        assert_eq!(names, vec![Some(json!("Bruno")), Some(json!("Zoe"))]);

        model.invalidate();
        assert!(!model.is_loaded());
    }

    #[tokio::test]
    async fn narrowed_criteria_reuse_the_held_set_and_wider_ones_refetch() {
        let service = Arc::new(MemoryCollection::new(vec![
            Row::new("1").with_field("name", "Carla").with_tags(["vip"]),
            Row::new("2").with_field("name", "Ana"),
            Row::new("3").with_field("name", "Bruno").with_tags(["vip"]),
        ]));
        let base = Criteria::default().with_tags(["vip"]);
        let model = FullSetStrategy::new(service.clone(), &base);

        assert_eq!(model.count_matching(&base).await.unwrap(), 2);
        let narrowed = base.clone().with_search("carla").with_sort(SortSpec::asc("name"));
        assert_eq!(model.load_all(&narrowed).await.unwrap().rows.len(), 1);
        assert_eq!(service.get_all_calls(), 1);

        let all = model.load_all(&Criteria::default()).await.unwrap();
        assert_eq!(all.total_count, 3);
        assert_eq!(service.get_all_calls(), 2);
    }
}
