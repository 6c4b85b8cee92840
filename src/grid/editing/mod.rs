// src/grid/editing/mod.rs
//! Single-cell optimistic editing.

pub mod coercion;
pub mod controller;
pub mod policy;

use crate::grid::definitions::RowPatch;

pub use coercion::{coerce_value, values_equivalent};
pub use controller::{CommitOutcome, EditingController};
pub use policy::EditBlockPolicy;

/// Keeps other in-memory copies of a row consistent after a committed mutation.
pub trait RefreshHook: Send + Sync {
    fn row_updated(&self, row_id: &str, patch: &RowPatch);

    fn rows_removed(&self, _ids: &[String]) {}
}
