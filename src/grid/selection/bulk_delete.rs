// src/grid/selection/bulk_delete.rs

use bevy::log::{error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use super::SelectionState;
use crate::grid::definitions::{Criteria, Row};
use crate::grid::editing::EditBlockPolicy;
use crate::grid::error::{GridError, GridResult};
use crate::grid::fetch::{PageRequest, RowModel};
use crate::grid::notify::{ConfirmationService, Notice, NotificationSink};
use crate::grid::service::CollectionService;
use crate::grid::store::RowStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// `ids` were deleted; `blocked` system rows were skipped.
    Deleted { ids: Vec<String>, blocked: usize },
    /// The user declined the confirmation prompt.
    Cancelled,
}

/// Splits rows into deletable ids and blocked ids, keeping selection order.
pub fn partition_deletable(rows: &[Row], policy: &EditBlockPolicy) -> (Vec<String>, Vec<String>) {
    let mut deletable = Vec::new();
    let mut blocked = Vec::new();
    for row in rows {
        if policy.is_delete_blocked(row) {
            blocked.push(row.id.clone());
        } else {
            deletable.push(row.id.clone());
        }
    }
    (deletable, blocked)
}

pub struct BulkDeleter {
    service: Arc<dyn CollectionService>,
    policy: EditBlockPolicy,
    sink: Arc<dyn NotificationSink>,
    confirm: Arc<dyn ConfirmationService>,
}

impl BulkDeleter {
    pub fn new(
        service: Arc<dyn CollectionService>,
        policy: EditBlockPolicy,
        sink: Arc<dyn NotificationSink>,
        confirm: Arc<dyn ConfirmationService>,
    ) -> Self {
        Self {
            service,
            policy,
            sink,
            confirm,
        }
    }

    /// Resolves the selected rows. "All matching" re-queries the row model instead
    /// of trusting the rows that happen to be materialized.
    pub async fn resolve(
        &self,
        selection: &SelectionState,
        store: &Mutex<RowStore>,
        model: &dyn RowModel,
        criteria: &Criteria,
    ) -> GridResult<Vec<Row>> {
        match selection {
            SelectionState::Explicit(ids) => {
                let store = store.lock();
                Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
            }
            SelectionState::AllMatching { excluded } => {
                let total = model
                    .count_matching(criteria)
                    .await
                    .map_err(GridError::LoadFailed)?;
                let page = model
                    .load_page(&PageRequest::first(total, criteria.clone()))
                    .await
                    .map_err(GridError::LoadFailed)?;
                Ok(page
                    .rows
                    .into_iter()
                    .filter(|row| !excluded.contains(&row.id))
                    .collect())
            }
        }
    }

    /// Partitions, confirms and issues one `delete_many`. The caller removes the
    /// deleted rows from its own collections.
    pub async fn execute(&self, rows: &[Row]) -> GridResult<DeleteOutcome> {
        if rows.is_empty() {
            self.sink.notify(Notice::warning("No rows selected"));
            return Err(GridError::NothingSelected);
        }
        let (ids, blocked) = partition_deletable(rows, &self.policy);
        if ids.is_empty() {
            warn!("Delete refused: all {} selected row(s) are system rows", blocked.len());
            self.sink.notify(Notice::error("Cannot delete system rows"));
            return Err(GridError::AllRowsProtected);
        }
        if !blocked.is_empty() {
            warn!("Skipping {} system row(s) in bulk delete: {:?}", blocked.len(), blocked);
            self.sink.notify(Notice::warning(format!(
                "{} system row(s) cannot be deleted and were skipped",
                blocked.len()
            )));
        }

        let prompt = format!("Delete {} row(s)? This cannot be undone.", ids.len());
        if !self.confirm.confirm(&prompt).await {
            info!("Bulk delete of {} row(s) cancelled", ids.len());
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(source) = self.service.delete_many(&ids).await {
            let err = GridError::DeleteFailed {
                count: ids.len(),
                source,
            };
            error!("{}", err);
            self.sink.notify(Notice::error(err.to_string()));
            return Err(err);
        }

        info!("Deleted {} row(s)", ids.len());
        // The undo hint is informational; deleted rows are not restorable.
        self.sink.notify(Notice::success(format!(
            "Deleted {} row(s). Undo is not available for deletions",
            ids.len()
        )));
        Ok(DeleteOutcome::Deleted {
            ids,
            blocked: blocked.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_keeps_order_and_splits_system_rows() {
        let rows = vec![
            Row::new("a"),
            Row::new("sys").protected(),
            Row::new("b"),
        ];
        let (deletable, blocked) = partition_deletable(&rows, &EditBlockPolicy::default());
        assert_eq!(deletable, vec!["a", "b"]);
        assert_eq!(blocked, vec!["sys"]);
    }
}
