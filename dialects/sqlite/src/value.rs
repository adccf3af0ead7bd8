//! SQLite value type conversions

use chrono::SecondsFormat;
use cormql::Value;

/// Convert a query value to a rusqlite parameter value.
///
/// SQLite has no date, boolean or json storage classes, so those travel as
/// TEXT (ISO 8601 for dates, serialized JSON) and INTEGER 0/1 for booleans.
/// The metadata-driven decoding in the core crate turns them back.
pub fn bind_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Integer(i) => rusqlite::types::Value::Integer(*i),
        Value::Float(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Date(d) => rusqlite::types::Value::Text(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => {
            rusqlite::types::Value::Text(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Value::List(items) => rusqlite::types::Value::Text(
            serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string()),
        ),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
    }
}

/// Convert a raw rusqlite value to a query value, preserving the storage
/// class as-is.
pub fn column_value(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(i) => Value::Integer(i),
        rusqlite::types::Value::Real(f) => Value::Float(f),
        rusqlite::types::Value::Text(s) => Value::Text(s),
        rusqlite::types::Value::Blob(b) => Value::Bytes(b),
    }
}
