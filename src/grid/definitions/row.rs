// src/grid/definitions/row.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named field values of a row. Ordered so serialized rows are stable.
pub type FieldMap = BTreeMap<String, Value>;

/// Partial row sent to the backing service. Edits always build a single-entry patch.
pub type RowPatch = FieldMap;

fn default_deletable() -> bool {
    true
}

/// One record of the grid's dataset.
///
/// Identity is the `id`; two rows with the same id are the same record even if
/// their field values differ. `deletable == false` marks a system row: it can't be
/// deleted and its protected fields can't be edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default = "default_deletable")]
    pub deletable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: FieldMap,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deletable: true,
            tags: Vec::new(),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
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

    /// Marks the row as a protected system row.
    pub fn protected(mut self) -> Self {
        self.deletable = false;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Writes a field and returns the value it replaced (`Null` if it was unset).
    pub fn set_field(&mut self, name: &str, value: Value) -> Value {
        self.fields
            .insert(name.to_string(), value)
            .unwrap_or(Value::Null)
    }

    pub fn apply_patch(&mut self, patch: &RowPatch) {
        for (name, value) in patch {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// True when the row carries at least one of `tags`. An empty list matches every row.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.is_empty() || self.tags.iter().any(|t| tags.iter().any(|want| want == t))
    }
}

/// Builds the minimal patch for one field.
pub fn single_field_patch(field: &str, value: Value) -> RowPatch {
    let mut patch = RowPatch::new();
    patch.insert(field.to_string(), value);
    patch
}
