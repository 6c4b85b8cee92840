// src/grid/editing/controller.rs
//! Optimistic single-cell commit with rollback.

use bevy::log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use super::coercion::{coerce_value, values_equivalent};
use super::policy::EditBlockPolicy;
use super::RefreshHook;
use crate::grid::definitions::{single_field_patch, ColumnDefinition};
use crate::grid::error::{GridError, GridResult};
use crate::grid::notify::{Notice, NotificationSink};
use crate::grid::service::CollectionService;
use crate::grid::store::RowStore;

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// No row with that id is materialized; nothing to persist against.
    NoRow,
    /// The coerced value equals the current one.
    Unchanged,
    Committed { previous: Value, value: Value },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

pub struct EditingController {
    service: Arc<dyn CollectionService>,
    policy: EditBlockPolicy,
    hooks: Vec<Arc<dyn RefreshHook>>,
    sink: Arc<dyn NotificationSink>,
}

impl EditingController {
    pub fn new(
        service: Arc<dyn CollectionService>,
        policy: EditBlockPolicy,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            service,
            policy,
            hooks: Vec::new(),
            sink,
        }
    }

    pub fn add_refresh_hook(&mut self, hook: Arc<dyn RefreshHook>) {
        self.hooks.push(hook);
    }

    pub fn policy(&self) -> &EditBlockPolicy {
        &self.policy
    }

    pub(crate) fn hooks(&self) -> &[Arc<dyn RefreshHook>] {
        &self.hooks
    }

    /// Coerces, applies optimistically, persists, and rolls back on failure.
    ///
    /// The store lock is never held across the service call, so a second edit to
    /// the same field may land while this one is in flight; rollback only restores
    /// the previous value if the field still holds the value written here.
    pub async fn commit_single_cell(
        &self,
        store: &Mutex<RowStore>,
        row_id: &str,
        column: &ColumnDefinition,
        proposed: Value,
    ) -> GridResult<CommitOutcome> {
        if row_id.trim().is_empty() {
            return Ok(CommitOutcome::NoRow);
        }
        let field = column.field.as_str();
        let value = coerce_value(proposed, column.data_type);

        let previous = {
            let mut store = store.lock();
            let Some(row) = store.get_mut(row_id) else {
                debug!("Edit for '{}' ignored: row not materialized", row_id);
                return Ok(CommitOutcome::NoRow);
            };
            if values_equivalent(row.field(field), &value) {
                return Ok(CommitOutcome::Unchanged);
            }
            if !column.editable || self.policy.is_edit_blocked(row, field) {
                // Nothing written yet; the view re-renders the stored value.
                let err = GridError::EditBlocked {
                    row_id: row_id.to_string(),
                    field: field.to_string(),
                };
                warn!("{}", err);
                self.sink.notify(Notice::error(err.to_string()));
                return Err(err);
            }
            row.fields.insert(field.to_string(), value.clone())
        };

        let patch = single_field_patch(field, value.clone());
        match self.service.update(row_id, &patch).await {
            Ok(()) => {
                for hook in &self.hooks {
                    hook.row_updated(row_id, &patch);
                }
                info!("Updated '{}' of row '{}'", field, row_id);
                let message = format!("Updated {}", column.header_or_field());
                self.sink.notify(Notice::success(message));
                Ok(CommitOutcome::Committed {
                    previous: previous.unwrap_or(Value::Null),
                    value,
                })
            }
            Err(source) => {
                self.rollback(store, row_id, field, &value, previous);
                let err = GridError::UpdateFailed {
                    row_id: row_id.to_string(),
                    source,
                };
                error!("{}", err);
                self.sink.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn rollback(
        &self,
        store: &Mutex<RowStore>,
        row_id: &str,
        field: &str,
        written: &Value,
        previous: Option<Value>,
    ) {
        let mut store = store.lock();
        let Some(row) = store.get_mut(row_id) else {
            return;
        };
        if row.field(field) != Some(written) {
            debug!(
                "Skipping rollback of '{}' on '{}': a newer edit replaced it",
                field, row_id
            );
            return;
        }
        match previous {
            Some(v) => {
                row.fields.insert(field.to_string(), v);
            }
            None => {
                row.fields.remove(field);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::memory::MemoryCollection;
    use crate::grid::definitions::{ColumnDataType, Row};
    use crate::grid::notify::LogSink;
    use crate::grid::service::PageResult;
    use serde_json::json;

    fn setup(rows: Vec<Row>) -> (Arc<MemoryCollection>, EditingController, Mutex<RowStore>) {
        let service = Arc::new(MemoryCollection::new(rows.clone()));
        let controller =
            EditingController::new(service.clone(), EditBlockPolicy::default(), Arc::new(LogSink));
        let mut store = RowStore::new();
        let total = rows.len();
        store.apply_page(PageResult::new(rows, total), false);
        (service, controller, Mutex::new(store))
    }

    #[tokio::test]
    async fn commit_persists_coerced_value() {
        let (service, controller, store) = setup(vec![Row::new("r1").with_field("age", 30)]);
        let column = ColumnDefinition::new("age", ColumnDataType::I64);
        let outcome = controller
            .commit_single_cell(&store, "r1", &column, json!("31"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                previous: json!(30),
                value: json!(31)
            }
        );
        assert_eq!(store.lock().get("r1").unwrap().field("age"), Some(&json!(31)));
        assert_eq!(service.update_calls(), 1);
    }

    #[tokio::test]
    async fn failed_update_removes_a_field_that_was_unset() {
        let (service, controller, store) = setup(vec![Row::new("r1")]);
        service.fail_updates(true);
        let err = controller
            .commit_single_cell(&store, "r1", &ColumnDefinition::text("note"), json!("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::UpdateFailed { .. }));
        assert_eq!(store.lock().get("r1").unwrap().field("note"), None);
    }

    #[tokio::test]
    async fn read_only_column_is_blocked() {
        let (service, controller, store) = setup(vec![Row::new("r1").with_field("id_code", "A")]);
        let column = ColumnDefinition::text("id_code").read_only();
        let err = controller
            .commit_single_cell(&store, "r1", &column, json!("B"))
            .await
            .unwrap_err();
        assert!(matches!(err, GridError::EditBlocked { .. }));
        assert_eq!(service.update_calls(), 0);
    }

    #[tokio::test]
    async fn system_row_other_fields_stay_editable() {
        let (service, controller, store) =
            setup(vec![Row::new("s1").protected().with_field("email", "a@x.org")]);
        let outcome = controller
            .commit_single_cell(&store, "s1", &ColumnDefinition::text("email"), json!("b@x.org"))
            .await
            .unwrap();
        assert!(outcome.is_committed());
        assert_eq!(service.update_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_or_empty_row_id_is_a_no_op() {
        let (service, controller, store) = setup(vec![Row::new("r1")]);
        let column = ColumnDefinition::text("name");
        for id in ["", "missing"] {
            let outcome = controller
                .commit_single_cell(&store, id, &column, json!("x"))
                .await
                .unwrap();
            assert_eq!(outcome, CommitOutcome::NoRow);
        }
        assert_eq!(service.update_calls(), 0);
    }
}
