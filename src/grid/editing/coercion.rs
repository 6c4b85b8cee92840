// src/grid/editing/coercion.rs
//! Coerces proposed cell values to the column's declared type.
//!
//! Values that can't be coerced become `Null` rather than failing the commit.

use chrono::{DateTime, NaiveDate};
use serde_json::{Number, Value};

use crate::grid::definitions::ColumnDataType;

pub fn coerce_value(value: Value, data_type: ColumnDataType) -> Value {
    if value.is_null() {
        return value;
    }
    match data_type {
        ColumnDataType::String => value,
        ColumnDataType::I64 => coerce_i64(&value),
        ColumnDataType::F64 => coerce_f64(&value),
        ColumnDataType::Bool => coerce_bool(&value),
        ColumnDataType::Date => coerce_date(&value),
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn coerce_i64(value: &Value) -> Value {
    if let Some(i) = value.as_i64() {
        return Value::from(i);
    }
    if let Value::String(s) = value {
        if let Ok(i) = s.trim().parse::<i64>() {
            return Value::from(i);
        }
    }
    match parse_number(value) {
        Some(f) if f >= i64::MIN as f64 && f <= i64::MAX as f64 => Value::from(f.trunc() as i64),
        _ => Value::Null,
    }
}

fn coerce_f64(value: &Value) -> Value {
    parse_number(value)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn coerce_bool(value: &Value) -> Value {
    match value {
        Value::Bool(_) => value.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Value::Bool(false),
            Some(f) if f == 1.0 => Value::Bool(true),
            _ => Value::Null,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Bool(true),
            "false" | "0" | "no" => Value::Bool(false),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Truncates anything date-like to `YYYY-MM-DD`.
fn coerce_date(value: &Value) -> Value {
    let Value::String(s) = value else {
        return Value::Null;
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Value::String(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    match s.get(..10).map(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d")) {
        Some(Ok(date)) => Value::String(date.format("%Y-%m-%d").to_string()),
        _ => Value::Null,
    }
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Equality used for no-op detection: `null`, a missing field and `""` are the same,
/// and numbers compare by value.
pub fn values_equivalent(current: Option<&Value>, proposed: &Value) -> bool {
    let (current_empty, proposed_empty) = (is_empty_value(current), is_empty_value(Some(proposed)));
    if current_empty || proposed_empty {
        return current_empty && proposed_empty;
    }
    match (current, proposed) {
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(a), b) => a == b,
        (None, _) => false,
    }
}
