// src/grid/definitions/column_definition.rs
use serde::{Deserialize, Serialize};

use super::column_data_type::ColumnDataType;

/// Column description supplied by the grid's caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Row field the column reads and writes.
    pub field: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub data_type: ColumnDataType,
    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

impl ColumnDefinition {
    pub fn new(field: impl Into<String>, data_type: ColumnDataType) -> Self {
        let field = field.into();
        Self {
            header: field.clone(),
            field,
            data_type,
            editable: true,
        }
    }

    pub fn text(field: impl Into<String>) -> Self {
        Self::new(field, ColumnDataType::String)
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn header_or_field(&self) -> &str {
        if self.header.trim().is_empty() {
            &self.field
        } else {
            &self.header
        }
    }
}

/// Finds the column for `field`, or a plain text column when the caller didn't declare one.
pub fn resolve_column(columns: &[ColumnDefinition], field: &str) -> ColumnDefinition {
    columns
        .iter()
        .find(|c| c.field == field)
        .cloned()
        .unwrap_or_else(|| ColumnDefinition::text(field))
}
