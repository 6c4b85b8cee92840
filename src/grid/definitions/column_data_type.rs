// src/grid/definitions/column_data_type.rs
use serde::{
    de::{self, Deserializer},
    Deserialize, Serialize,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum ColumnDataType {
    #[default]
    String,
    Bool,
    I64,
    F64,
    Date,
}

impl ColumnDataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnDataType::I64 | ColumnDataType::F64)
    }
}

impl fmt::Display for ColumnDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// Column definitions come from the caller as loose strings ("number", "text", ...)
impl<'de> Deserialize<'de> for ColumnDataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        let as_str = match v {
            serde_json::Value::String(s) => s,
            other => {
                return Err(de::Error::custom(format!(
                    "ColumnDataType must be string, got {}",
                    other
                )))
            }
        };
        parse_column_data_type(&as_str)
            .ok_or_else(|| de::Error::custom(format!("Unknown ColumnDataType '{}'", as_str)))
    }
}

pub fn parse_column_data_type(s: &str) -> Option<ColumnDataType> {
    match s.trim() {
        "String" | "string" | "Text" | "text" | "email" | "phone" => Some(ColumnDataType::String),
        "Bool" | "bool" | "Boolean" | "boolean" | "checkbox" => Some(ColumnDataType::Bool),
        "I64" | "i64" | "Int" | "int" | "integer" | "I32" | "i32" => Some(ColumnDataType::I64),
        "F64" | "f64" | "Float" | "float" | "Number" | "number" | "numeric" | "currency" => {
            Some(ColumnDataType::F64)
        }
        "Date" | "date" | "dateString" | "datetime" | "DateTime" => Some(ColumnDataType::Date),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_type_names() {
        assert_eq!(parse_column_data_type(" number "), Some(ColumnDataType::F64));
        assert_eq!(parse_column_data_type("dateString"), Some(ColumnDataType::Date));
        assert_eq!(parse_column_data_type("text"), Some(ColumnDataType::String));
        assert_eq!(parse_column_data_type("blob"), None);
    }

    #[test]
    fn deserialize_rejects_non_strings() {
        let ok: ColumnDataType = serde_json::from_str("\"int\"").unwrap();
        assert_eq!(ok, ColumnDataType::I64);
        assert!(serde_json::from_str::<ColumnDataType>("3").is_err());
    }
}
