// src/grid/history/manager.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{CellEdit, EditHistory};

/// Size-aware façade over an `EditHistory`. Holds no log of its own; the
/// counters are a cache of the history's sizes, refreshed after every mutation.
pub struct UndoRedoManager {
    history: Arc<dyn EditHistory>,
    undo_count: AtomicUsize,
    redo_count: AtomicUsize,
}

impl UndoRedoManager {
    pub fn new(history: Arc<dyn EditHistory>) -> Self {
        let manager = Self {
            history,
            undo_count: AtomicUsize::new(0),
            redo_count: AtomicUsize::new(0),
        };
        manager.refresh();
        manager
    }

    pub fn refresh(&self) {
        self.undo_count
            .store(self.history.undo_count(), Ordering::SeqCst);
        self.redo_count
            .store(self.history.redo_count(), Ordering::SeqCst);
    }

    pub fn undo_count(&self) -> usize {
        self.undo_count.load(Ordering::SeqCst)
    }

    pub fn redo_count(&self) -> usize {
        self.redo_count.load(Ordering::SeqCst)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_count() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_count() > 0
    }

    pub fn record(&self, edit: CellEdit) {
        self.history.record(edit);
        self.refresh();
    }

    pub fn undo(&self) -> Option<CellEdit> {
        let edit = self.history.undo();
        self.refresh();
        edit
    }

    pub fn redo(&self) -> Option<CellEdit> {
        let edit = self.history.redo();
        self.refresh();
        edit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::history::CellEditHistory;
    use serde_json::json;

    #[test]
    fn counters_follow_the_history() {
        let history = Arc::new(CellEditHistory::default());
        let manager = UndoRedoManager::new(history.clone());
        assert!(!manager.can_undo() && !manager.can_redo());

        manager.record(CellEdit {
            row_id: "r".into(),
            field: "f".into(),
            previous: json!("a"),
            value: json!("b"),
        });
        assert!(manager.can_undo());

        // Changes made directly on the history only show up after a refresh.
        history.clear();
        assert!(manager.can_undo());
        manager.refresh();
        assert!(!manager.can_undo());
    }
}
