// src/grid/selection/mod.rs
//! Row selection and bulk delete.

pub mod bulk_delete;

use serde::Serialize;
use std::collections::BTreeSet;

pub use bulk_delete::{partition_deletable, BulkDeleter, DeleteOutcome};

/// What the view has selected: specific ids, or every row matching the current
/// criteria minus explicit exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SelectionState {
    Explicit(BTreeSet<String>),
    AllMatching { excluded: BTreeSet<String> },
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState::Explicit(BTreeSet::new())
    }
}

impl SelectionState {
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            SelectionState::Explicit(ids) => {
                ids.insert(id);
            }
            SelectionState::AllMatching { excluded } => {
                excluded.remove(&id);
            }
        }
    }

    pub fn deselect(&mut self, id: &str) {
        match self {
            SelectionState::Explicit(ids) => {
                ids.remove(id);
            }
            SelectionState::AllMatching { excluded } => {
                excluded.insert(id.to_string());
            }
        }
    }

    pub fn toggle(&mut self, id: &str) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.select(id);
        }
    }

    pub fn select_all_matching(&mut self) {
        *self = SelectionState::AllMatching {
            excluded: BTreeSet::new(),
        };
    }

    pub fn clear(&mut self) {
        *self = SelectionState::default();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        match self {
            SelectionState::Explicit(ids) => ids.contains(id),
            SelectionState::AllMatching { excluded } => !excluded.contains(id),
        }
    }

    /// Number of explicitly selected ids. `None` for "all matching", which needs a query.
    pub fn explicit_len(&self) -> Option<usize> {
        match self {
            SelectionState::Explicit(ids) => Some(ids.len()),
            SelectionState::AllMatching { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.explicit_len() == Some(0)
    }
}
