//! Decoded rows and their populated relation trees.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use cormql::Value;

use crate::dialect::Row;
use crate::error::DatabaseError;
use crate::metadata::{ColumnClass, ColumnMetadata, ColumnType, ContentTypeMetadata};

/// Attribute-keyed payload for create and update. This is also the mutable
/// view handed to `Before` hooks, so whatever a hook writes here is what
/// reaches the engine.
pub type EntityData = BTreeMap<String, Value>;

/// A populated relation value: to-one kinds hold at most one entity,
/// collection kinds hold an ordered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Population {
    One(Option<Entity>),
    Many(Vec<Entity>),
}

/// One row of a content type, keyed by attribute names rather than column
/// names. Relations appear only when the query asked for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Population>,
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Population> {
        self.relations.get(name)
    }

    /// Decodes a result row against the type's column metadata. Columns the
    /// row does not carry come back as `Null`; a row without an integer `id`
    /// is a driver fault, not data.
    pub(crate) fn from_row(
        metadata: &ContentTypeMetadata,
        mut row: Row,
    ) -> Result<Entity, DatabaseError> {
        let id = match row.remove("id") {
            Some(Value::Integer(id)) => id,
            other => {
                return Err(DatabaseError::Driver {
                    message: format!("row for {} has no integer id (got {:?})", metadata.uid, other),
                })
            }
        };

        let mut fields = BTreeMap::new();
        for (name, attribute) in &metadata.attributes {
            let Some(column) = attribute.as_column() else { continue };
            let raw = row.remove(column.column_name.as_str()).unwrap_or(Value::Null);
            fields.insert(name.clone(), decode_column(column, raw)?);
        }

        Ok(Entity { id, fields, relations: BTreeMap::new() })
    }
}

/// Folds engine-level shapes back into the attribute's value space: the
/// embedded engine hands booleans back as integers and json/temporal columns
/// as text.
fn decode_column(column: &ColumnMetadata, value: Value) -> Result<Value, DatabaseError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match (column.column_type.class(), value) {
        (ColumnClass::Boolean, Value::Integer(n)) => Ok(Value::Bool(n != 0)),
        (ColumnClass::Json, Value::Text(text)) => {
            serde_json::from_str(&text).map(Value::Json).map_err(|err| DatabaseError::Driver {
                message: format!("column {} holds malformed json: {err}", column.column_name),
            })
        }
        (ColumnClass::Temporal, Value::Text(text)) => decode_temporal(column, &text),
        (_, value) => Ok(value),
    }
}

fn decode_temporal(column: &ColumnMetadata, text: &str) -> Result<Value, DatabaseError> {
    let parsed = match column.column_type {
        ColumnType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(Value::Date),
        _ => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
    };
    parsed.ok_or_else(|| DatabaseError::Driver {
        message: format!("column {} holds an unreadable timestamp: {text:?}", column.column_name),
    })
}
