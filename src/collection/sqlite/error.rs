// src/collection/sqlite/error.rs

use std::fmt;

use crate::grid::error::ServiceError;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    SerdeJson(serde_json::Error),
    InvalidField(String),
    NotFound(String),
    Other(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// True when the statement was cancelled through the connection's interrupt handle.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::OperationInterrupted
        )
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Sqlite(e) => write!(f, "SQLite error: {}", e),
            DbError::Io(e) => write!(f, "I/O error: {}", e),
            DbError::SerdeJson(e) => write!(f, "JSON error: {}", e),
            DbError::InvalidField(name) => write!(f, "Invalid field name: {}", name),
            DbError::NotFound(id) => write!(f, "Row not found: {}", id),
            DbError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DbError {}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::Sqlite(e)
    }
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Io(e)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::SerdeJson(e)
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        if e.is_interrupted() {
            return ServiceError::Aborted;
        }
        match e {
            DbError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Backend(other.to_string()),
        }
    }
}
