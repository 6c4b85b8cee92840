// src/grid/state.rs
//! Observable grid state. The rendering side subscribes and reads snapshots.

use serde::Serialize;
use tokio::sync::watch;

use crate::grid::fetch::RowModelKind;
use crate::grid::virtualizer::RowWindow;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridSnapshot {
    /// Bumped on every published change.
    pub version: u64,
    pub model: Option<RowModelKind>,
    pub row_count: usize,
    pub total_count: usize,
    pub has_more: bool,
    pub window: RowWindow,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub total_height: f32,
    pub loading: bool,
    pub load_failed: Option<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub selected_count: Option<usize>,
}

#[derive(Debug)]
pub struct GridState {
    tx: watch::Sender<GridSnapshot>,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new()
    }
}

impl GridState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GridSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<GridSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.tx.borrow().clone()
    }

    /// Applies `f` and publishes the result, even when nobody is subscribed.
    pub fn update(&self, f: impl FnOnce(&mut GridSnapshot)) {
        self.tx.send_modify(|snapshot| {
            f(snapshot);
            snapshot.version += 1;
        });
    }
}
