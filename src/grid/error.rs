// src/grid/error.rs

use thiserror::Error;

/// Error returned by a backing collection service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("request was aborted")]
    Aborted,
    #[error("row '{0}' not found")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the grid runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),
    #[error("field '{field}' of row '{row_id}' is protected and cannot be edited")]
    EditBlocked { row_id: String, field: String },
    #[error("failed to update row '{row_id}': {source}")]
    UpdateFailed {
        row_id: String,
        #[source]
        source: ServiceError,
    },
    #[error("failed to delete {count} row(s): {source}")]
    DeleteFailed {
        count: usize,
        #[source]
        source: ServiceError,
    },
    #[error("failed to load rows: {0}")]
    LoadFailed(#[source] ServiceError),
    #[error("load was aborted")]
    Aborted,
    #[error("no rows selected")]
    NothingSelected,
    #[error("cannot delete system rows")]
    AllRowsProtected,
    #[error("export failed: {0}")]
    Export(String),
}

pub type GridResult<T> = Result<T, GridError>;

impl From<std::io::Error> for GridError {
    fn from(e: std::io::Error) -> Self {
        GridError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(e: serde_json::Error) -> Self {
        GridError::Export(e.to_string())
    }
}
