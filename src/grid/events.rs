// src/grid/events.rs
use bevy::prelude::Event;
use serde_json::Value;
use std::path::PathBuf;

use crate::grid::definitions::{Criteria, Row};

// --- Requests (view -> grid) ---

/// The scroll container moved.
#[derive(Event, Debug, Clone)]
pub struct ScrollGridEvent {
    pub offset: f32,
}

/// The scroll container was laid out or resized.
#[derive(Event, Debug, Clone)]
pub struct AttachViewportEvent {
    pub viewport_height: f32,
}

/// A rendered row reported its measured height.
#[derive(Event, Debug, Clone)]
pub struct RowMeasuredEvent {
    pub index: usize,
    pub height: f32,
}

/// Commit of a single cell from the view.
#[derive(Event, Debug, Clone)]
pub struct UpdateCellEvent {
    pub row_id: String,
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Select(String),
    Deselect(String),
    Toggle(String),
    AllMatching,
    Clear,
}

#[derive(Event, Debug, Clone)]
pub struct RequestSelectionChange {
    pub change: SelectionChange,
}

#[derive(Event, Debug, Clone, Default)]
pub struct RequestDeleteSelected;

#[derive(Event, Debug, Clone, Default)]
pub struct RequestUndo;

#[derive(Event, Debug, Clone, Default)]
pub struct RequestRedo;

#[derive(Event, Debug, Clone, Default)]
pub struct RequestGridRefresh;

/// Replaces search/filters/sort and reloads from the first page.
#[derive(Event, Debug, Clone)]
pub struct RequestSetCriteria {
    pub criteria: Criteria,
}

#[derive(Event, Debug, Clone, Default)]
pub struct RequestAbortLoad;

/// Writes every matching row to `path` as JSON.
#[derive(Event, Debug, Clone)]
pub struct RequestExportJson {
    pub path: PathBuf,
}

/// Loads one row through the shared detail cache.
#[derive(Event, Debug, Clone)]
pub struct RequestRowDetail {
    pub row_id: String,
}

// --- Results (grid -> view) ---

/// User-visible message, drained from the grid's notification channel.
#[derive(Event, Debug, Clone)]
pub struct GridOperationFeedback {
    pub message: String,
    pub is_error: bool,
}

/// Sent whenever a new grid snapshot was mirrored into `GridView`.
#[derive(Event, Debug, Clone)]
pub struct GridDataModifiedEvent {
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridOperation {
    Initialize,
    LoadNextPage,
    UpdateCell,
    Undo,
    Redo,
    DeleteSelected,
    Refresh,
    SetCriteria,
    Export,
    RowDetail,
}

/// Completion of a background grid task. `Err` carries the error text.
#[derive(Event, Debug, Clone)]
pub struct GridTaskFinished {
    pub operation: GridOperation,
    pub result: Result<String, String>,
}

/// Result of `RequestRowDetail`. `row` is `None` for unknown ids and failed loads.
#[derive(Event, Debug, Clone)]
pub struct RowDetailLoaded {
    pub row_id: String,
    pub row: Option<Row>,
}
