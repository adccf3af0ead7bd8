//! Interleaved SQL text and bindings, collapsed per paramstyle at the end.
//!
//! Builders append raw SQL and bound values in one pass without caring which
//! placeholder syntax the engine wants; `collapse` numbers the placeholders.
//! Caller-supplied values only ever travel as bindings.

use cormql::{Filter, Operator, Value};

use crate::dialect::{Dialect, Paramstyle, Statement};
use crate::error::ValidationError;
use crate::metadata::ContentTypeMetadata;

enum SqlExpr {
    Sql(String),
    Bind(Value),
}

pub(crate) struct SqlWriter {
    parts: Vec<SqlExpr>,
}

impl SqlWriter {
    pub fn new() -> Self {
        SqlWriter { parts: Vec::new() }
    }

    pub fn sql(&mut self, text: impl Into<String>) -> &mut Self {
        self.parts.push(SqlExpr::Sql(text.into()));
        self
    }

    pub fn bind(&mut self, value: Value) -> &mut Self {
        self.parts.push(SqlExpr::Bind(value));
        self
    }

    pub fn collapse(self, paramstyle: Paramstyle) -> Statement {
        let mut sql = String::new();
        let mut bindings = Vec::new();
        for part in self.parts {
            match part {
                SqlExpr::Sql(text) => sql.push_str(&text),
                SqlExpr::Bind(value) => {
                    bindings.push(value);
                    match paramstyle {
                        Paramstyle::Positional => sql.push('?'),
                        Paramstyle::Numbered => {
                            sql.push('$');
                            sql.push_str(&bindings.len().to_string());
                        }
                    }
                }
            }
        }
        Statement { sql, bindings }
    }
}

/// Renders a filter tree into `writer`. The filter must already have passed
/// [`validate`](super::validate); field resolution errors here mean a caller
/// skipped that step.
pub(crate) fn push_filter(
    writer: &mut SqlWriter,
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    qualifier: Option<&str>,
    filter: &Filter,
) -> Result<(), ValidationError> {
    match filter {
        Filter::And(filters) => push_combinator(writer, dialect, metadata, qualifier, filters, " AND "),
        Filter::Or(filters) => push_combinator(writer, dialect, metadata, qualifier, filters, " OR "),
        Filter::Condition { field, operator, value } => {
            push_condition(writer, dialect, metadata, qualifier, field, *operator, value)
        }
    }
}

fn push_combinator(
    writer: &mut SqlWriter,
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    qualifier: Option<&str>,
    filters: &[Filter],
    separator: &str,
) -> Result<(), ValidationError> {
    writer.sql("(");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            writer.sql(separator);
        }
        push_filter(writer, dialect, metadata, qualifier, filter)?;
    }
    writer.sql(")");
    Ok(())
}

fn push_condition(
    writer: &mut SqlWriter,
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    qualifier: Option<&str>,
    field: &str,
    operator: Operator,
    value: &Value,
) -> Result<(), ValidationError> {
    let column = metadata.column(field).ok_or_else(|| ValidationError::UnknownField {
        uid: metadata.uid.clone(),
        field: field.to_string(),
    })?;
    let target = qualified(dialect, qualifier, &column.column_name);

    match operator {
        Operator::Eq => comparison(writer, &target, "=", value),
        Operator::Ne => comparison(writer, &target, "<>", value),
        Operator::Lt => comparison(writer, &target, "<", value),
        Operator::Lte => comparison(writer, &target, "<=", value),
        Operator::Gt => comparison(writer, &target, ">", value),
        Operator::Gte => comparison(writer, &target, ">=", value),
        Operator::In => in_list(writer, &target, "IN", value),
        Operator::NotIn => in_list(writer, &target, "NOT IN", value),
        Operator::Contains => like(writer, &target, "LIKE", value),
        Operator::NotContains => like(writer, &target, "NOT LIKE", value),
        Operator::Null => {
            writer.sql(format!("{target} IS NULL"));
        }
        Operator::NotNull => {
            writer.sql(format!("{target} IS NOT NULL"));
        }
        Operator::Between => {
            let (low, high) = match value {
                Value::List(items) if items.len() == 2 => (items[0].clone(), items[1].clone()),
                _ => (Value::Null, Value::Null),
            };
            writer.sql(format!("{target} BETWEEN ")).bind(low).sql(" AND ").bind(high);
        }
    }
    Ok(())
}

fn comparison(writer: &mut SqlWriter, target: &str, op: &str, value: &Value) {
    writer.sql(format!("{target} {op} ")).bind(value.clone());
}

fn in_list(writer: &mut SqlWriter, target: &str, op: &str, value: &Value) {
    let items = match value {
        Value::List(items) => items.as_slice(),
        _ => &[],
    };
    writer.sql(format!("{target} {op} ("));
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer.bind(item.clone());
    }
    writer.sql(")");
}

fn like(writer: &mut SqlWriter, target: &str, op: &str, value: &Value) {
    let needle = value.as_text().unwrap_or_default();
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    writer.sql(format!("{target} {op} ")).bind(Value::Text(format!("%{escaped}%")));
    writer.sql(" ESCAPE '\\'");
}

pub(crate) fn qualified(dialect: &dyn Dialect, qualifier: Option<&str>, column: &str) -> String {
    match qualifier {
        Some(table) => format!("{}.{}", dialect.quote_identifier(table), dialect.quote_identifier(column)),
        None => dialect.quote_identifier(column),
    }
}
