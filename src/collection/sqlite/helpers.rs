// src/collection/sqlite/helpers.rs
// SQL fragments for reading rows by criteria

use rusqlite::types::Value as SqlValue;

use super::error::{DbError, DbResult};
use crate::grid::definitions::{Criteria, SortDirection, SortSpec};

/// Quote a SQL identifier by wrapping it in double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build a string of SQL placeholders (?, ?, ?, ...).
pub fn build_placeholders(count: usize) -> String {
    (0..count).map(|_| "?").collect::<Vec<_>>().join(", ")
}

/// JSON path of a row field inside the `data` column.
pub fn json_path(field: &str) -> DbResult<String> {
    if field.is_empty() || field.contains('"') || field.contains('\\') {
        return Err(DbError::InvalidField(field.to_string()));
    }
    Ok(format!("$.\"{}\"", field))
}

/// `WHERE` clause and parameters for `criteria`. The tag restriction runs in SQL;
/// search and column filters go through `grid_row_matches`.
pub fn build_where(criteria: &Criteria) -> DbResult<(String, Vec<SqlValue>)> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if !criteria.tags.is_empty() {
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(t.tags) WHERE json_each.value IN ({}))",
            build_placeholders(criteria.tags.len())
        ));
        params.extend(criteria.tags.iter().cloned().map(SqlValue::Text));
    }

    if !criteria.search.trim().is_empty() || !criteria.filters.is_empty() {
        for column in criteria.filters.keys() {
            json_path(column)?;
        }
        let row_criteria = Criteria {
            search: criteria.search.clone(),
            filters: criteria.filters.clone(),
            sort: Vec::new(),
            tags: Vec::new(),
        };
        clauses.push("grid_row_matches(t.data, ?)".to_string());
        params.push(SqlValue::Text(serde_json::to_string(&row_criteria)?));
    }

    if clauses.is_empty() {
        Ok((String::new(), params))
    } else {
        Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
    }
}

/// `ORDER BY` clause: blanks, then numbers by value, then normalized text
/// when ascending. Insertion order is the final tiebreak.
pub fn build_order(sort: &[SortSpec]) -> DbResult<(String, Vec<SqlValue>)> {
    let mut terms = Vec::new();
    let mut params = Vec::new();
    for spec in sort {
        let path = json_path(&spec.column_id)?;
        let (blank_dir, dir) = match spec.direction {
            SortDirection::Asc => ("DESC", "ASC"),
            SortDirection::Desc => ("ASC", "DESC"),
        };
        terms.push(format!("grid_blank(json_extract(t.data, ?)) {}", blank_dir));
        terms.push(format!("(grid_num(json_extract(t.data, ?)) IS NULL) {}", dir));
        terms.push(format!("grid_num(json_extract(t.data, ?)) {}", dir));
        terms.push(format!("grid_norm(json_extract(t.data, ?)) {}", dir));
        for _ in 0..4 {
            params.push(SqlValue::Text(path.clone()));
        }
    }
    terms.push("t.rowid ASC".to_string());
    Ok((format!(" ORDER BY {}", terms.join(", ")), params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::definitions::{ColumnFilter, FilterOperator};

    #[test]
    fn identifiers_and_paths_are_quoted() {
        assert_eq!(quote_identifier("grid rows"), "\"grid rows\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(json_path("first name").unwrap(), "$.\"first name\"");
        assert!(matches!(json_path("bad\"field"), Err(DbError::InvalidField(_))));
    }

    #[test]
    fn unfiltered_criteria_has_no_where() {
        let (sql, params) = build_where(&Criteria::default()).unwrap();
        assert!(sql.is_empty() && params.is_empty());
    }

    #[test]
    fn tags_and_filters_combine_with_and() {
        let criteria = Criteria::default()
            .with_tags(["donor", "board"])
            .with_filter("city", ColumnFilter::new(FilterOperator::Equals, "Lyon"));
        let (sql, params) = build_where(&criteria).unwrap();
        assert!(sql.contains("IN (?, ?)"));
        assert!(sql.contains(" AND grid_row_matches"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn order_ranks_blanks_numbers_and_text_per_column() {
        let (sql, params) = build_order(&[SortSpec::desc("name"), SortSpec::asc("score")]).unwrap();
        assert!(sql.starts_with(" ORDER BY grid_blank"));
        assert!(sql.contains("(grid_num(json_extract(t.data, ?)) IS NULL) DESC"));
        assert!(sql.contains("(grid_num(json_extract(t.data, ?)) IS NULL) ASC"));
        assert!(sql.ends_with("t.rowid ASC"));
        assert_eq!(params.len(), 8);
    }
}
