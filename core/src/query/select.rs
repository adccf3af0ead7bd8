//! SELECT and COUNT statements from a validated query.

use cormql::{Query, SortDirection, SortItem, Value};

use crate::dialect::{Dialect, Statement};
use crate::error::ValidationError;
use crate::metadata::ContentTypeMetadata;
use crate::query::writer::{push_filter, qualified, SqlWriter};

/// The explicit projection for a type: `id` first, then every scalar column
/// in attribute order. Nothing ever selects `*`, so join-table columns and
/// future columns cannot leak into results.
pub(crate) fn select_columns(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    qualifier: Option<&str>,
) -> String {
    let mut parts = vec![qualified(dialect, qualifier, "id")];
    for column in metadata.columns() {
        parts.push(qualified(dialect, qualifier, &column.column_name));
    }
    parts.join(", ")
}

pub(crate) fn build_select(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    query: &Query,
) -> Result<Statement, ValidationError> {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {} FROM {}",
        select_columns(dialect, metadata, None),
        dialect.quote_identifier(&metadata.table_name)
    ));
    if let Some(filter) = &query.filter {
        writer.sql(" WHERE ");
        push_filter(&mut writer, dialect, metadata, None, filter)?;
    }
    writer.sql(order_by_sql(dialect, metadata, None, &query.order_by)?);
    push_pagination(&mut writer, query);
    Ok(writer.collapse(dialect.paramstyle()))
}

pub(crate) fn build_count(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    query: &Query,
) -> Result<Statement, ValidationError> {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT COUNT(*) AS {} FROM {}",
        dialect.quote_identifier("count"),
        dialect.quote_identifier(&metadata.table_name)
    ));
    if let Some(filter) = &query.filter {
        writer.sql(" WHERE ");
        push_filter(&mut writer, dialect, metadata, None, filter)?;
    }
    Ok(writer.collapse(dialect.paramstyle()))
}

/// ORDER BY clause with the requested items plus an `id ASC` tiebreak, so
/// equal sort keys cannot reshuffle between pages.
pub(crate) fn order_by_sql(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    qualifier: Option<&str>,
    items: &[SortItem],
) -> Result<String, ValidationError> {
    let mut parts = Vec::with_capacity(items.len() + 1);
    let mut saw_id = false;
    for item in items {
        let column = metadata.column(&item.field).ok_or_else(|| ValidationError::UnknownField {
            uid: metadata.uid.clone(),
            field: item.field.clone(),
        })?;
        saw_id |= column.column_name == "id";
        parts.push(format!(
            "{} {}",
            qualified(dialect, qualifier, &column.column_name),
            direction_sql(item.direction)
        ));
    }
    if !saw_id {
        parts.push(format!("{} ASC", qualified(dialect, qualifier, "id")));
    }
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

fn push_pagination(writer: &mut SqlWriter, query: &Query) {
    // The embedded engine only takes OFFSET after a LIMIT, so an offset on
    // its own gets an effectively unbounded one.
    let limit = match (query.limit, query.offset) {
        (Some(limit), _) => Some(i64::try_from(limit).unwrap_or(i64::MAX)),
        (None, Some(_)) => Some(i64::MAX),
        (None, None) => None,
    };
    if let Some(limit) = limit {
        writer.sql(" LIMIT ").bind(Value::Integer(limit));
    }
    if let Some(offset) = query.offset {
        writer.sql(" OFFSET ").bind(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
    }
}
