// src/grid/history/mod.rs
//! Cell edit history and the counter façade the grid polls.

pub mod manager;

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

pub use manager::UndoRedoManager;

/// One committed cell change.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row_id: String,
    pub field: String,
    pub previous: Value,
    pub value: Value,
}

/// History owned by the editing surface. The grid only reads its sizes and asks
/// it for the change to replay.
pub trait EditHistory: Send + Sync {
    fn undo_count(&self) -> usize;

    fn redo_count(&self) -> usize;

    fn record(&self, edit: CellEdit);

    /// Moves the newest undoable edit onto the redo stack and returns it.
    fn undo(&self) -> Option<CellEdit>;

    /// Moves the newest redoable edit back onto the undo stack and returns it.
    fn redo(&self) -> Option<CellEdit>;

    fn clear(&self);
}

#[derive(Debug, Default)]
struct Stacks {
    undo: VecDeque<CellEdit>,
    redo: Vec<CellEdit>,
}

/// Bounded undo/redo stacks of single-cell edits.
#[derive(Debug)]
pub struct CellEditHistory {
    stacks: Mutex<Stacks>,
    max_entries: usize,
}

impl Default for CellEditHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CellEditHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            stacks: Mutex::new(Stacks::default()),
            max_entries: max_entries.max(1),
        }
    }
}

impl EditHistory for CellEditHistory {
    fn undo_count(&self) -> usize {
        self.stacks.lock().undo.len()
    }

    fn redo_count(&self) -> usize {
        self.stacks.lock().redo.len()
    }

    fn record(&self, edit: CellEdit) {
        let mut stacks = self.stacks.lock();
        stacks.undo.push_back(edit);
        stacks.redo.clear();
        while stacks.undo.len() > self.max_entries {
            stacks.undo.pop_front();
        }
    }

    fn undo(&self) -> Option<CellEdit> {
        let mut stacks = self.stacks.lock();
        let edit = stacks.undo.pop_back()?;
        stacks.redo.push(edit.clone());
        Some(edit)
    }

    fn redo(&self) -> Option<CellEdit> {
        let mut stacks = self.stacks.lock();
        let edit = stacks.redo.pop()?;
        stacks.undo.push_back(edit.clone());
        Some(edit)
    }

    fn clear(&self) {
        let mut stacks = self.stacks.lock();
        stacks.undo.clear();
        stacks.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edit(n: i64) -> CellEdit {
        CellEdit {
            row_id: "r1".into(),
            field: "score".into(),
            previous: json!(n - 1),
            value: json!(n),
        }
    }

    #[test]
    fn undo_then_redo_moves_between_stacks() {
        let history = CellEditHistory::default();
        history.record(edit(1));
        history.record(edit(2));
        assert_eq!(history.undo(), Some(edit(2)));
        assert_eq!((history.undo_count(), history.redo_count()), (1, 1));
        assert_eq!(history.redo(), Some(edit(2)));
        assert_eq!((history.undo_count(), history.redo_count()), (2, 0));
    }

    #[test]
    fn new_edit_clears_redo_and_oldest_entries_fall_off() {
        let history = CellEditHistory::new(2);
        history.record(edit(1));
        history.record(edit(2));
        history.undo();
        history.record(edit(3));
        assert_eq!(history.redo_count(), 0);
        history.record(edit(4));
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.undo(), Some(edit(4)));
        assert_eq!(history.undo(), Some(edit(3)));
        assert_eq!(history.undo(), None);
    }
}
