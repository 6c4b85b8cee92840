// src/collection/sqlite/writer.rs
// Every SQL write of the SQLite collection goes through here.

use rusqlite::{params, params_from_iter, Connection};

use super::error::{DbError, DbResult};
use super::helpers::{build_placeholders, json_path, quote_identifier};
use crate::grid::definitions::{Row, RowPatch};

pub struct DbWriter;

impl DbWriter {
    /// Inserts or replaces rows in one transaction.
    pub fn upsert_rows(conn: &mut Connection, table: &str, rows: &[Row]) -> DbResult<usize> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, deletable, tags, data) VALUES (?1, ?2, ?3, ?4)",
            quote_identifier(table)
        );
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.deletable,
                    serde_json::to_string(&row.tags)?,
                    serde_json::to_string(&row.fields)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Writes each patched field into the row's JSON data. All-or-nothing.
    pub fn update_fields(
        conn: &mut Connection,
        table: &str,
        id: &str,
        patch: &RowPatch,
    ) -> DbResult<()> {
        let sql = format!(
            "UPDATE {} SET data = json_set(data, ?1, json(?2)) WHERE id = ?3",
            quote_identifier(table)
        );
        let tx = conn.transaction()?;
        for (field, value) in patch {
            let changed = tx.execute(
                &sql,
                params![json_path(field)?, serde_json::to_string(value)?, id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(id.to_string()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes the given ids in one statement. Unknown ids are ignored.
    pub fn delete_ids(conn: &mut Connection, table: &str, ids: &[String]) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            quote_identifier(table),
            build_placeholders(ids.len())
        );
        let tx = conn.transaction()?;
        let deleted = tx.execute(&sql, params_from_iter(ids.iter()))?;
        tx.commit()?;
        Ok(deleted)
    }
}
