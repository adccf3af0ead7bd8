//! Startup DDL generated from the compiled registry.
//!
//! This is idempotent bootstrap (`CREATE ... IF NOT EXISTS`), not a migration
//! engine: it brings a fresh database up to the mapped shape and leaves an
//! existing one alone. Entity tables are emitted before the join tables that
//! reference them, and tables referenced by a foreign key are emitted before
//! the table carrying the constraint so the inline `REFERENCES` clause is
//! valid on engines that resolve it eagerly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::dialect::{Dialect, Statement};
use crate::metadata::{
    ColumnType, ContentTypeMetadata, ForeignKeyMetadata, IndexMetadata, JoinTable,
    JoinTableMetadata, MetadataRegistry, MorphJoinTableMetadata,
};

/// All statements required to bootstrap `registry` on `dialect`, in
/// execution order. Statements carry no bindings; every identifier comes from
/// the compiler, never from request input.
pub fn bootstrap_statements(registry: &MetadataRegistry, dialect: &dyn Dialect) -> Vec<Statement> {
    let mut statements = Vec::new();

    for metadata in ordered_types(registry) {
        statements.push(create_entity_table(metadata, dialect));
        for index in &metadata.indexes {
            statements.push(create_index(&metadata.table_name, index, dialect));
        }
    }

    // Both sides of a two-way relation carry the same join table.
    let mut seen = BTreeSet::new();
    for (_, metadata) in registry.iter() {
        for join in metadata.join_tables() {
            if !seen.insert(join.table_name().to_string()) {
                continue;
            }
            match join {
                JoinTable::Plain(jt) => {
                    statements.push(create_join_table(jt, dialect));
                    for index in &jt.indexes {
                        statements.push(create_index(&jt.table_name, index, dialect));
                    }
                }
                JoinTable::Morph(mjt) => {
                    statements.push(create_morph_join_table(mjt, dialect));
                    for index in &mjt.indexes {
                        statements.push(create_index(&mjt.table_name, index, dialect));
                    }
                }
            }
        }
    }

    statements
}

/// Entity types sorted so that foreign key targets come first. Ties and the
/// remainder of a reference cycle fall back to uid order, which keeps the
/// output deterministic.
fn ordered_types(registry: &MetadataRegistry) -> Vec<&Arc<ContentTypeMetadata>> {
    let types: BTreeMap<&str, &Arc<ContentTypeMetadata>> =
        registry.iter().map(|(uid, metadata)| (uid.as_str(), metadata)).collect();
    let by_table: BTreeMap<&str, &str> =
        registry.iter().map(|(uid, metadata)| (metadata.table_name.as_str(), uid.as_str())).collect();

    let mut pending: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (uid, metadata) in registry.iter() {
        let mut waits_on = BTreeSet::new();
        for fk in &metadata.foreign_keys {
            // Self references are valid inline on every engine.
            if let Some(dep) = by_table.get(fk.references_table.as_str()) {
                if *dep != uid.as_str() {
                    waits_on.insert(*dep);
                }
            }
        }
        pending.insert(uid.as_str(), waits_on);
    }

    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let next = pending
            .iter()
            .find(|(_, waits_on)| waits_on.is_empty())
            .map(|(uid, _)| *uid)
            .or_else(|| pending.keys().next().copied());
        let Some(uid) = next else { break };
        pending.remove(uid);
        for waits_on in pending.values_mut() {
            waits_on.remove(uid);
        }
        if let Some(metadata) = types.get(uid) {
            ordered.push(*metadata);
        }
    }
    ordered
}

fn create_entity_table(metadata: &ContentTypeMetadata, dialect: &dyn Dialect) -> Statement {
    let mut parts =
        vec![format!("{} {}", dialect.quote_identifier("id"), dialect.primary_key_sql())];
    for column in metadata.columns() {
        let mut definition = format!(
            "{} {}",
            dialect.quote_identifier(&column.column_name),
            dialect.column_type_sql(column.column_type)
        );
        if !column.nullable {
            definition.push_str(" NOT NULL");
        }
        parts.push(definition);
    }
    for fk in &metadata.foreign_keys {
        parts.push(foreign_key_sql(fk, dialect));
    }
    create_table(&metadata.table_name, &parts, dialect)
}

fn create_join_table(jt: &JoinTableMetadata, dialect: &dyn Dialect) -> Statement {
    let mut parts = vec![
        format!("{} {}", dialect.quote_identifier("id"), dialect.primary_key_sql()),
        link_column(&jt.source_column, dialect),
        link_column(&jt.target_column, dialect),
    ];
    if let Some(order) = &jt.order_column {
        parts.push(format!(
            "{} {}",
            dialect.quote_identifier(order),
            dialect.column_type_sql(ColumnType::Float)
        ));
    }
    for fk in &jt.foreign_keys {
        parts.push(foreign_key_sql(fk, dialect));
    }
    create_table(&jt.table_name, &parts, dialect)
}

fn create_morph_join_table(mjt: &MorphJoinTableMetadata, dialect: &dyn Dialect) -> Statement {
    let mut parts = vec![
        format!("{} {}", dialect.quote_identifier("id"), dialect.primary_key_sql()),
        link_column(&mjt.source_column, dialect),
        link_column(&mjt.target_id_column, dialect),
        format!(
            "{} {}",
            dialect.quote_identifier(&mjt.target_type_column),
            dialect.column_type_sql(ColumnType::String)
        ),
    ];
    if let Some(order) = &mjt.order_column {
        parts.push(format!(
            "{} {}",
            dialect.quote_identifier(order),
            dialect.column_type_sql(ColumnType::Float)
        ));
    }
    for fk in &mjt.foreign_keys {
        parts.push(foreign_key_sql(fk, dialect));
    }
    create_table(&mjt.table_name, &parts, dialect)
}

fn link_column(name: &str, dialect: &dyn Dialect) -> String {
    format!("{} {}", dialect.quote_identifier(name), dialect.column_type_sql(ColumnType::BigInteger))
}

fn foreign_key_sql(fk: &ForeignKeyMetadata, dialect: &dyn Dialect) -> String {
    format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
        dialect.quote_identifier(&fk.name),
        dialect.quote_identifier(&fk.column),
        dialect.quote_identifier(&fk.references_table),
        dialect.quote_identifier("id"),
        fk.on_delete.as_sql(),
    )
}

fn create_table(table_name: &str, parts: &[String], dialect: &dyn Dialect) -> Statement {
    Statement::new(
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            dialect.quote_identifier(table_name),
            parts.join(", ")
        ),
        Vec::new(),
    )
}

fn create_index(table_name: &str, index: &IndexMetadata, dialect: &dyn Dialect) -> Statement {
    let columns = index
        .columns
        .iter()
        .map(|column| dialect.quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ");
    let unique = if index.unique { "UNIQUE " } else { "" };
    Statement::new(
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            unique,
            dialect.quote_identifier(&index.name),
            dialect.quote_identifier(table_name),
            columns
        ),
        Vec::new(),
    )
}
