//! INSERT, UPDATE, DELETE and the join-table link statements.
//!
//! Scalar payloads are attribute-keyed [`EntityData`]; relation links never
//! travel through the scalar path, they are attached and detached through the
//! join statements at the bottom.

use cormql::Value;

use crate::dialect::{Dialect, Statement};
use crate::entity::EntityData;
use crate::error::ValidationError;
use crate::metadata::{ContentTypeMetadata, JoinTableMetadata, MorphJoinTableMetadata};
use crate::query::writer::SqlWriter;

/// One row of a polymorphic join table.
pub(crate) struct MorphLink {
    pub source_id: i64,
    pub target_uid: String,
    pub target_id: i64,
    pub order: Option<f64>,
}

/// Maps payload keys to columns. Relation keys and `id` are rejected here:
/// ids are assigned by the engine and links have their own statements.
fn scalar_columns<'a>(
    metadata: &'a ContentTypeMetadata,
    data: &'a EntityData,
) -> Result<Vec<(&'a str, &'a Value)>, ValidationError> {
    let mut columns = Vec::with_capacity(data.len());
    for (key, value) in data {
        if key == "id" {
            return Err(ValidationError::InvalidPayload {
                reason: "id is assigned by the database".to_string(),
            });
        }
        match metadata.attributes.get(key) {
            Some(attribute) => match attribute.as_column() {
                Some(column) => columns.push((column.column_name.as_str(), value)),
                None => {
                    return Err(ValidationError::InvalidPayload {
                        reason: format!("{key} is a relation; use attach / detach"),
                    })
                }
            },
            None => {
                return Err(ValidationError::UnknownField {
                    uid: metadata.uid.clone(),
                    field: key.clone(),
                })
            }
        }
    }
    Ok(columns)
}

pub(crate) fn build_insert(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    data: &EntityData,
) -> Result<Statement, ValidationError> {
    let columns = scalar_columns(metadata, data)?;
    let mut writer = SqlWriter::new();
    writer.sql(format!("INSERT INTO {} ", dialect.quote_identifier(&metadata.table_name)));

    if columns.is_empty() {
        writer.sql("DEFAULT VALUES");
    } else {
        let names = columns
            .iter()
            .map(|(name, _)| dialect.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ");
        writer.sql(format!("({names}) VALUES ("));
        for (i, (_, value)) in columns.iter().enumerate() {
            if i > 0 {
                writer.sql(", ");
            }
            writer.bind((*value).clone());
        }
        writer.sql(")");
    }

    if dialect.supports_returning() {
        writer.sql(format!(" RETURNING {}", dialect.quote_identifier("id")));
    }
    Ok(writer.collapse(dialect.paramstyle()))
}

pub(crate) fn build_update(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    id: i64,
    data: &EntityData,
) -> Result<Statement, ValidationError> {
    let columns = scalar_columns(metadata, data)?;
    if columns.is_empty() {
        return Err(ValidationError::InvalidPayload {
            reason: "update needs at least one scalar attribute".to_string(),
        });
    }

    let mut writer = SqlWriter::new();
    writer.sql(format!("UPDATE {} SET ", dialect.quote_identifier(&metadata.table_name)));
    for (i, (name, value)) in columns.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer.sql(format!("{} = ", dialect.quote_identifier(name)));
        writer.bind((*value).clone());
    }
    writer.sql(format!(" WHERE {} = ", dialect.quote_identifier("id")));
    writer.bind(Value::Integer(id));
    Ok(writer.collapse(dialect.paramstyle()))
}

pub(crate) fn build_delete(
    dialect: &dyn Dialect,
    metadata: &ContentTypeMetadata,
    id: i64,
) -> Statement {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "DELETE FROM {} WHERE {} = ",
        dialect.quote_identifier(&metadata.table_name),
        dialect.quote_identifier("id")
    ));
    writer.bind(Value::Integer(id));
    writer.collapse(dialect.paramstyle())
}

pub(crate) fn build_join_attach(
    dialect: &dyn Dialect,
    jt: &JoinTableMetadata,
    source_id: i64,
    target_ids: &[i64],
    order_base: f64,
) -> Statement {
    let mut names = vec![
        dialect.quote_identifier(&jt.source_column),
        dialect.quote_identifier(&jt.target_column),
    ];
    if let Some(order) = &jt.order_column {
        names.push(dialect.quote_identifier(order));
    }

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.quote_identifier(&jt.table_name),
        names.join(", ")
    ));
    for (i, target_id) in target_ids.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer.sql("(").bind(Value::Integer(source_id)).sql(", ").bind(Value::Integer(*target_id));
        if jt.order_column.is_some() {
            writer.sql(", ").bind(Value::Float(order_base + (i as f64) + 1.0));
        }
        writer.sql(")");
    }
    writer.collapse(dialect.paramstyle())
}

/// Removes links for `source_id`; an empty `target_ids` removes them all.
pub(crate) fn build_join_detach(
    dialect: &dyn Dialect,
    jt: &JoinTableMetadata,
    source_id: i64,
    target_ids: &[i64],
) -> Statement {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "DELETE FROM {} WHERE {} = ",
        dialect.quote_identifier(&jt.table_name),
        dialect.quote_identifier(&jt.source_column)
    ));
    writer.bind(Value::Integer(source_id));
    if !target_ids.is_empty() {
        writer.sql(format!(" AND {} IN (", dialect.quote_identifier(&jt.target_column)));
        for (i, target_id) in target_ids.iter().enumerate() {
            if i > 0 {
                writer.sql(", ");
            }
            writer.bind(Value::Integer(*target_id));
        }
        writer.sql(")");
    }
    writer.collapse(dialect.paramstyle())
}

pub(crate) fn build_morph_attach(
    dialect: &dyn Dialect,
    mjt: &MorphJoinTableMetadata,
    links: &[MorphLink],
) -> Statement {
    let mut names = vec![
        dialect.quote_identifier(&mjt.source_column),
        dialect.quote_identifier(&mjt.target_id_column),
        dialect.quote_identifier(&mjt.target_type_column),
    ];
    if let Some(order) = &mjt.order_column {
        names.push(dialect.quote_identifier(order));
    }

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "INSERT INTO {} ({}) VALUES ",
        dialect.quote_identifier(&mjt.table_name),
        names.join(", ")
    ));
    for (i, link) in links.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer
            .sql("(")
            .bind(Value::Integer(link.source_id))
            .sql(", ")
            .bind(Value::Integer(link.target_id))
            .sql(", ")
            .bind(Value::Text(link.target_uid.clone()));
        if mjt.order_column.is_some() {
            writer.sql(", ").bind(link.order.map(Value::Float).unwrap_or(Value::Null));
        }
        writer.sql(")");
    }
    writer.collapse(dialect.paramstyle())
}

/// Removes polymorphic links for `source_id`; an empty `targets` removes
/// them all.
pub(crate) fn build_morph_detach(
    dialect: &dyn Dialect,
    mjt: &MorphJoinTableMetadata,
    source_id: i64,
    targets: &[(String, i64)],
) -> Statement {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "DELETE FROM {} WHERE {} = ",
        dialect.quote_identifier(&mjt.table_name),
        dialect.quote_identifier(&mjt.source_column)
    ));
    writer.bind(Value::Integer(source_id));
    if !targets.is_empty() {
        writer.sql(" AND (");
        for (i, (uid, target_id)) in targets.iter().enumerate() {
            if i > 0 {
                writer.sql(" OR ");
            }
            writer
                .sql(format!("({} = ", dialect.quote_identifier(&mjt.target_type_column)))
                .bind(Value::Text(uid.clone()))
                .sql(format!(" AND {} = ", dialect.quote_identifier(&mjt.target_id_column)))
                .bind(Value::Integer(*target_id))
                .sql(")");
        }
        writer.sql(")");
    }
    writer.collapse(dialect.paramstyle())
}

/// Points a foreign key column at `target` (or NULL) for every id in `ids`.
pub(crate) fn build_fk_update(
    dialect: &dyn Dialect,
    table: &str,
    column: &str,
    target: Option<i64>,
    ids: &[i64],
) -> Statement {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "UPDATE {} SET {} = ",
        dialect.quote_identifier(table),
        dialect.quote_identifier(column)
    ));
    writer.bind(target.map(Value::Integer).unwrap_or(Value::Null));
    writer.sql(format!(" WHERE {} IN (", dialect.quote_identifier("id")));
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer.bind(Value::Integer(*id));
    }
    writer.sql(")");
    writer.collapse(dialect.paramstyle())
}

/// Clears a foreign key column on every row pointing at `source_id`,
/// restricted to `ids` when given. Empty `ids` means all of them.
pub(crate) fn build_fk_detach(
    dialect: &dyn Dialect,
    table: &str,
    column: &str,
    source_id: i64,
    ids: &[i64],
) -> Statement {
    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "UPDATE {} SET {} = ",
        dialect.quote_identifier(table),
        dialect.quote_identifier(column)
    ));
    writer.bind(Value::Null);
    writer.sql(format!(" WHERE {} = ", dialect.quote_identifier(column)));
    writer.bind(Value::Integer(source_id));
    if !ids.is_empty() {
        writer.sql(format!(" AND {} IN (", dialect.quote_identifier("id")));
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                writer.sql(", ");
            }
            writer.bind(Value::Integer(*id));
        }
        writer.sql(")");
    }
    writer.collapse(dialect.paramstyle())
}
