//! Postgres value type conversions

use bytes::BytesMut;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

use cormql::Value;

use crate::error::PostgresError;

/// A query value as a statement parameter.
///
/// Postgres infers each parameter's type from the prepared statement, so the
/// encoding has to follow the column rather than the value: integers narrow
/// to the column width, and text payloads destined for date, timestamp or
/// json columns are parsed before encoding. That keeps JSON-sourced entity
/// data (where everything arrives as text) bindable against typed columns.
#[derive(Debug)]
pub(crate) struct PgParam(pub Value);

impl ToSql for PgParam {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match &self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Integer(i) => {
                if *ty == Type::INT2 {
                    (*i as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*i as i32).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*i as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*i as f64).to_sql(ty, out)
                } else {
                    i.to_sql(ty, out)
                }
            }
            Value::Float(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    f.to_sql(ty, out)
                }
            }
            Value::Text(s) => {
                if *ty == Type::DATE {
                    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")?.to_sql(ty, out)
                } else if *ty == Type::TIMESTAMPTZ {
                    chrono::DateTime::parse_from_rfc3339(s)?
                        .with_timezone(&chrono::Utc)
                        .to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP {
                    chrono::DateTime::parse_from_rfc3339(s)?.naive_utc().to_sql(ty, out)
                } else if *ty == Type::JSON || *ty == Type::JSONB {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                } else {
                    s.to_sql(ty, out)
                }
            }
            Value::Date(d) => d.to_sql(ty, out),
            Value::DateTime(dt) => {
                if *ty == Type::TIMESTAMP {
                    dt.naive_utc().to_sql(ty, out)
                } else {
                    dt.to_sql(ty, out)
                }
            }
            Value::List(items) => serde_json::to_value(items)?.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Json(j) => {
                if *ty == Type::JSON || *ty == Type::JSONB {
                    j.to_sql(ty, out)
                } else {
                    j.to_string().to_sql(ty, out)
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Decode one column of a result row by its server-reported type, mapping
/// SQL NULL to [`Value::Null`].
pub(crate) fn column_value(
    row: &tokio_postgres::Row,
    index: usize,
) -> Result<Value, PostgresError> {
    let ty = row.columns()[index].type_();
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(index)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(index)?.map(|i| Value::Integer(i as i64))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(index)?.map(|i| Value::Integer(i as i64))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(index)?.map(Value::Integer)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)?.map(|f| Value::Float(f as f64))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index)?.map(Value::Float)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR {
        row.try_get::<_, Option<String>>(index)?.map(Value::Text)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(index)?.map(Value::Bytes)
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<chrono::NaiveDate>>(index)?.map(Value::Date)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)?.map(Value::DateTime)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<chrono::NaiveDateTime>>(index)?
            .map(|dt| Value::DateTime(dt.and_utc()))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(index)?.map(Value::Json)
    } else {
        return Err(PostgresError::UnsupportedType(ty.to_string()));
    };
    Ok(value.unwrap_or(Value::Null))
}
