// src/grid/definitions/criteria.rs
//! Filter/search/sort criteria shared by both row models.
//!
//! Paged mode forwards a `Criteria` verbatim to the backing service. Full-set mode
//! and the in-memory collection evaluate it here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

use super::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Contains,
    NotContains,
    Equals,
    NotEqual,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Blank,
    NotBlank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

impl ColumnFilter {
    pub fn new(operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column_id: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Everything that narrows or orders the row collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filters: BTreeMap<String, ColumnFilter>,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Criteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, filter: ColumnFilter) -> Self {
        self.filters.insert(column.into(), filter);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && self.filters.is_empty() && self.tags.is_empty()
    }

    /// True when every row matching `self` also matches `scope`. Sort is ignored.
    pub fn is_within(&self, scope: &Criteria) -> bool {
        let search = normalize_for_cmp(&self.search).contains(&normalize_for_cmp(&scope.search));
        let filters = scope
            .filters
            .iter()
            .all(|(column, filter)| self.filters.get(column) == Some(filter));
        let tags = scope.tags.is_empty()
            || (!self.tags.is_empty() && self.tags.iter().all(|t| scope.tags.contains(t)));
        search && filters && tags
    }

    pub fn without_sort(&self) -> Criteria {
        Criteria {
            sort: Vec::new(),
            ..self.clone()
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        if !row.has_any_tag(&self.tags) {
            return false;
        }
        if !self.matches_search(row) {
            return false;
        }
        self.filters
            .iter()
            .all(|(column, filter)| filter_matches(filter, row.field(column)))
    }

    fn matches_search(&self, row: &Row) -> bool {
        let needle = normalize_for_cmp(&self.search);
        if needle.is_empty() {
            return true;
        }
        row.fields
            .values()
            .any(|v| normalize_for_cmp(&value_text(v)).contains(&needle))
    }

    /// Stable multi-column sort. Rows without a value sort first when ascending.
    pub fn sort_rows(&self, rows: &mut [Row]) {
        if self.sort.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for spec in &self.sort {
                let ord = compare_values(a.field(&spec.column_id), b.field(&spec.column_id));
                let ord = match spec.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Filters then sorts a borrowed collection into an owned result.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut matched: Vec<Row> = rows.into_iter().filter(|r| self.matches(r)).cloned().collect();
        self.sort_rows(&mut matched);
        matched
    }
}

/// Case, accent and whitespace insensitive form used for every text comparison.
pub fn normalize_for_cmp(s: &str) -> String {
    s.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Display text of a cell value. `Null` renders as the empty string.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

/// Sort rank of a cell: blanks, then numbers, then text.
enum SortKey {
    Blank,
    Number(f64, String),
    Text(String),
}

fn sort_key(v: Option<&Value>) -> SortKey {
    let v = match v {
        Some(v) if !is_blank(Some(v)) => v,
        _ => return SortKey::Blank,
    };
    let text = normalize_for_cmp(&value_text(v));
    match value_number(v) {
        Some(n) => SortKey::Number(n, text),
        None => SortKey::Text(text),
    }
}

/// Total order over cells. Numbers never compare against text, so mixed
/// columns can't form cycles; equal numbers fall back to their text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (SortKey::Blank, SortKey::Blank) => Ordering::Equal,
        (SortKey::Blank, _) => Ordering::Less,
        (_, SortKey::Blank) => Ordering::Greater,
        (SortKey::Number(x, xs), SortKey::Number(y, ys)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| xs.cmp(&ys)),
        (SortKey::Number(..), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(..)) => Ordering::Greater,
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(&y),
    }
}

fn filter_matches(filter: &ColumnFilter, cell: Option<&Value>) -> bool {
    let cell_value = cell.cloned().unwrap_or(Value::Null);
    let texts = || {
        (
            normalize_for_cmp(&value_text(&cell_value)),
            normalize_for_cmp(&value_text(&filter.value)),
        )
    };
    let numeric = || value_number(&cell_value).zip(value_number(&filter.value));

    match filter.operator {
        FilterOperator::Blank => is_blank(cell),
        FilterOperator::NotBlank => !is_blank(cell),
        FilterOperator::Contains => {
            let (have, want) = texts();
            have.contains(&want)
        }
        FilterOperator::NotContains => {
            let (have, want) = texts();
            !have.contains(&want)
        }
        FilterOperator::StartsWith => {
            let (have, want) = texts();
            have.starts_with(&want)
        }
        FilterOperator::EndsWith => {
            let (have, want) = texts();
            have.ends_with(&want)
        }
        FilterOperator::Equals => match numeric() {
            Some((x, y)) => x == y,
            None => {
                let (have, want) = texts();
                have == want
            }
        },
        FilterOperator::NotEqual => match numeric() {
            Some((x, y)) => x != y,
            None => {
                let (have, want) = texts();
                have != want
            }
        },
        FilterOperator::GreaterThan => match numeric() {
            Some((x, y)) => x > y,
            None => {
                let (have, want) = texts();
                !is_blank(cell) && have > want
            }
        },
        FilterOperator::LessThan => match numeric() {
            Some((x, y)) => x < y,
            None => {
                let (have, want) = texts();
                !is_blank(cell) && have < want
            }
        },
    }
}
