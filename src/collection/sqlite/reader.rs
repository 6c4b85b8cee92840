// src/collection/sqlite/reader.rs

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::error::DbResult;
use super::helpers::{build_order, build_where, quote_identifier};
use crate::grid::definitions::{Criteria, FieldMap, Row};

type RawRow = (String, i64, String, String);

fn decode((id, deletable, tags, data): RawRow) -> DbResult<Row> {
    Ok(Row {
        id,
        deletable: deletable != 0,
        tags: serde_json::from_str(&tags)?,
        fields: serde_json::from_str::<FieldMap>(&data)?,
    })
}

pub struct DbReader;

impl DbReader {
    pub fn count(conn: &Connection, table: &str, criteria: &Criteria) -> DbResult<usize> {
        let (where_sql, params) = build_where(criteria)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} AS t{}",
            quote_identifier(table),
            where_sql
        );
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Matching rows in criteria order, skipping `offset` and returning at most `limit`.
    pub fn rows(
        conn: &Connection,
        table: &str,
        criteria: &Criteria,
        offset: usize,
        limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let (where_sql, mut params) = build_where(criteria)?;
        let (order_sql, order_params) = build_order(&criteria.sort)?;
        params.extend(order_params);
        params.push(SqlValue::Integer(limit.map(|l| l as i64).unwrap_or(-1)));
        params.push(SqlValue::Integer(offset as i64));

        let sql = format!(
            "SELECT t.id, t.deletable, t.tags, t.data FROM {} AS t{}{} LIMIT ? OFFSET ?",
            quote_identifier(table),
            where_sql,
            order_sql
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;
        raw.into_iter().map(decode).collect()
    }

    pub fn get(conn: &Connection, table: &str, id: &str) -> DbResult<Option<Row>> {
        let sql = format!(
            "SELECT id, deletable, tags, data FROM {} WHERE id = ?",
            quote_identifier(table)
        );
        let raw: Option<RawRow> = conn
            .query_row(&sql, params![id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()?;
        raw.map(decode).transpose()
    }
}
