// src/collection/sqlite/mod.rs
//! `CollectionService` backed by one SQLite table.
//!
//! Rows are stored as `(id, deletable, tags, data)` with `tags` and `data` as
//! JSON text. Every call runs on `spawn_blocking`; `abort` interrupts the running
//! statement and bumps a generation counter so reads that were already queued
//! resolve as aborted too.

pub mod connection;
pub mod error;
pub mod helpers;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub mod test_helpers;

pub use connection::DbConnection;
pub use error::{DbError, DbResult};
pub use reader::DbReader;
pub use writer::DbWriter;

use async_trait::async_trait;
use bevy::log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, InterruptHandle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::grid::cache::EntityLoader;
use crate::grid::definitions::{Criteria, Row, RowPatch};
use crate::grid::error::ServiceError;
use crate::grid::service::{CollectionService, PageResult};

pub const DEFAULT_TABLE: &str = "contacts";

/// Database storage configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub data_path: PathBuf,
}

impl DbConfig {
    pub fn default_path() -> PathBuf {
        let documents = directories_next::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        documents.join("Gridwind")
    }

    pub fn new() -> Self {
        Self {
            data_path: Self::default_path(),
        }
    }

    pub fn database_file(&self) -> PathBuf {
        self.data_path.join("grid.db")
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SqliteCollection {
    conn: Arc<Mutex<Connection>>,
    table: Arc<str>,
    interrupt: Arc<InterruptHandle>,
    generation: Arc<AtomicU64>,
}

impl SqliteCollection {
    pub fn open(path: &Path, table: &str) -> DbResult<Self> {
        info!("Opening collection '{}' in {:?}", table, path);
        Self::from_connection(DbConnection::open(path)?, table)
    }

    pub fn open_in_memory(table: &str) -> DbResult<Self> {
        Self::from_connection(DbConnection::open_in_memory()?, table)
    }

    fn from_connection(conn: Connection, table: &str) -> DbResult<Self> {
        DbConnection::ensure_table(&conn, table)?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: Arc::from(table),
            interrupt,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Blocking upsert used for seeding and imports.
    pub fn upsert_rows(&self, rows: &[Row]) -> DbResult<usize> {
        DbWriter::upsert_rows(&mut self.conn.lock(), &self.table, rows)
    }

    /// Blocking lookup by id.
    pub fn get(&self, id: &str) -> DbResult<Option<Row>> {
        DbReader::get(&self.conn.lock(), &self.table, id)
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &str) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = Arc::clone(&self.table);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn, &table)
        })
        .await
        .map_err(|e| DbError::Other(format!("{} task failed: {}", op, e)))?
    }

    /// Reads are dropped as aborted when `abort` ran while they were queued or running.
    async fn read<T, F>(&self, op: &'static str, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &str) -> DbResult<T> + Send + 'static,
    {
        let started = self.generation.load(Ordering::SeqCst);
        let result = self.run(op, f).await;
        if self.generation.load(Ordering::SeqCst) != started {
            debug!("SqliteCollection: {} finished after abort; dropping result", op);
            return Err(ServiceError::Aborted);
        }
        result.map_err(|e| {
            if !e.is_interrupted() {
                warn!("SqliteCollection: {} failed: {}", op, e);
            }
            ServiceError::from(e)
        })
    }

    /// Writes report their real outcome; an interrupted write fails and rolls back.
    async fn write<T, F>(&self, op: &'static str, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &str) -> DbResult<T> + Send + 'static,
    {
        self.run(op, f).await.map_err(|e| {
            warn!("SqliteCollection: {} failed: {}", op, e);
            ServiceError::from(e)
        })
    }
}

#[async_trait]
impl CollectionService for SqliteCollection {
    async fn count(&self, criteria: &Criteria) -> Result<usize, ServiceError> {
        let criteria = criteria.clone();
        self.read("count", move |conn, table| DbReader::count(conn, table, &criteria))
            .await
    }

    async fn get_page(
        &self,
        criteria: &Criteria,
        start_row: usize,
        end_row: usize,
    ) -> Result<PageResult, ServiceError> {
        let criteria = criteria.clone();
        let limit = end_row.saturating_sub(start_row);
        self.read("get_page", move |conn, table| {
            let total = DbReader::count(conn, table, &criteria)?;
            let rows = DbReader::rows(conn, table, &criteria, start_row, Some(limit))?;
            Ok(PageResult::new(rows, total))
        })
        .await
    }

    async fn get_all(&self, criteria: &Criteria) -> Result<PageResult, ServiceError> {
        let criteria = criteria.clone();
        self.read("get_all", move |conn, table| {
            let rows = DbReader::rows(conn, table, &criteria, 0, None)?;
            let total = rows.len();
            Ok(PageResult::new(rows, total))
        })
        .await
    }

    async fn update(&self, id: &str, patch: &RowPatch) -> Result<(), ServiceError> {
        let id = id.to_string();
        let patch = patch.clone();
        self.write("update", move |conn, table| {
            DbWriter::update_fields(conn, table, &id, &patch)
        })
        .await
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), ServiceError> {
        let ids = ids.to_vec();
        let deleted = self
            .write("delete_many", move |conn, table| DbWriter::delete_ids(conn, table, &ids))
            .await?;
        info!("SqliteCollection: deleted {} row(s)", deleted);
        Ok(())
    }

    fn abort(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.interrupt.interrupt();
        info!("SqliteCollection: outstanding requests on '{}' aborted", self.table);
    }
}

/// Row lookup for the detail cache.
#[async_trait]
impl EntityLoader<Option<Row>> for SqliteCollection {
    async fn fetch(&self, key: &str) -> Result<Option<Row>, ServiceError> {
        let id = key.to_string();
        self.read("get", move |conn, table| DbReader::get(conn, table, &id))
            .await
    }
}
