// src/collection/sqlite/connection.rs

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;

use super::error::DbResult;
use super::helpers::quote_identifier;
use crate::grid::definitions::{
    is_blank, normalize_for_cmp, value_number, value_text, Criteria, FieldMap, Row,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct DbConnection;

impl DbConnection {
    /// Opens (or creates) a database file with WAL journaling and the grid's SQL functions.
    pub fn open(path: &Path) -> DbResult<Connection> {
        let conn = Connection::open(path)?;

        // PRAGMA settings are per connection; apply them on every open.
        let journal_mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            bevy::log::warn!(
                "Failed to set WAL mode on database {:?}. Current mode: {}",
                path.file_name(),
                journal_mode
            );
        } else {
            bevy::log::debug!("WAL mode activated for database {:?}", path.file_name());
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;
        register_functions(&conn)?;
        Ok(conn)
    }

    pub fn open_in_memory() -> DbResult<Connection> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        Ok(conn)
    }

    pub fn ensure_table(conn: &Connection, table: &str) -> DbResult<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                deletable INTEGER NOT NULL DEFAULT 1,
                tags TEXT NOT NULL DEFAULT '[]',
                data TEXT NOT NULL DEFAULT '{{}}'
            )",
            quote_identifier(table)
        ))?;
        Ok(())
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}

/// SQL functions that give SQLite the same text and filter semantics as the
/// in-memory criteria evaluator.
fn register_functions(conn: &Connection) -> DbResult<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("grid_norm", 1, flags, |ctx| {
        Ok(normalize_for_cmp(&value_text(&sql_to_json(ctx.get_raw(0)))))
    })?;
    conn.create_scalar_function("grid_num", 1, flags, |ctx| {
        Ok(value_number(&sql_to_json(ctx.get_raw(0))))
    })?;
    conn.create_scalar_function("grid_blank", 1, flags, |ctx| {
        Ok(is_blank(Some(&sql_to_json(ctx.get_raw(0)))))
    })?;
    conn.create_scalar_function("grid_row_matches", 2, flags, row_matches)?;
    Ok(())
}

/// `grid_row_matches(data, criteria_json)`: search and column filters over the row's JSON data.
fn row_matches(ctx: &Context<'_>) -> rusqlite::Result<bool> {
    let criteria = ctx.get_or_create_aux(1, |raw| -> Result<Criteria, BoxError> {
        Ok(serde_json::from_str(raw.as_str()?)?)
    })?;
    let data: String = ctx.get(0)?;
    let fields: FieldMap = serde_json::from_str(&data)
        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
    let row = Row {
        id: String::new(),
        deletable: true,
        tags: Vec::new(),
        fields,
    };
    Ok(criteria.matches(&row))
}
