
use std::sync::Arc;

use anyhow::Result;
use common::*;
use corm::core::metadata::JoinTable;
use corm::{Database, DatabaseOptions, Dialect, Filter, HookRegistry, Query, Statement, Value};
use corm_sqlite::SqliteDialect;

async fn table_names(dialect: &Arc<SqliteDialect>) -> Result<Vec<String>> {
    let rows = dialect
        .query(&Statement::new(
            "SELECT \"name\" FROM sqlite_master WHERE \"type\" = 'table'",
            Vec::new(),
        ))
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|mut row| match row.remove("name") {
            Some(Value::Text(name)) => Some(name),
            _ => None,
        })
        .collect())
}

#[tokio::test]
async fn bootstrap_creates_every_mapped_table() -> Result<()> {
    let (dialect, db) = connect(&restaurant_schemas()).await?;
    let tables = table_names(&dialect).await?;

    for (_, metadata) in db.registry().iter() {
        assert!(tables.contains(&metadata.table_name), "missing table {}", metadata.table_name);
        for join in metadata.join_tables() {
            assert!(
                tables.iter().any(|table| table == join.table_name()),
                "missing join table {}",
                join.table_name()
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn every_generated_identifier_fits_the_engine_budget() -> Result<()> {
    let (dialect, db) = connect(&restaurant_schemas()).await?;
    let budget = dialect.max_identifier_length();
    let check = |name: &str| assert!(name.len() <= budget, "{name} is over {budget} chars");

    for (_, metadata) in db.registry().iter() {
        check(&metadata.table_name);
        for column in metadata.columns() {
            check(&column.column_name);
        }
        for index in &metadata.indexes {
            check(&index.name);
        }
        for fk in &metadata.foreign_keys {
            check(&fk.name);
        }
        for join in metadata.join_tables() {
            match join {
                JoinTable::Plain(jt) => {
                    check(&jt.table_name);
                    check(&jt.source_column);
                    check(&jt.target_column);
                    if let Some(order) = &jt.order_column {
                        check(order);
                    }
                    for index in &jt.indexes {
                        check(&index.name);
                    }
                    for fk in &jt.foreign_keys {
                        check(&fk.name);
                    }
                }
                JoinTable::Morph(mjt) => {
                    check(&mjt.table_name);
                    check(&mjt.source_column);
                    check(&mjt.target_id_column);
                    check(&mjt.target_type_column);
                    if let Some(order) = &mjt.order_column {
                        check(order);
                    }
                    for index in &mjt.indexes {
                        check(&index.name);
                    }
                    for fk in &mjt.foreign_keys {
                        check(&fk.name);
                    }
                }
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn reconnecting_over_an_existing_database_keeps_data() -> Result<()> {
    let (dialect, db) = connect(&restaurant_schemas()).await?;
    let created = db
        .query(RESTAURANT)?
        .create(data(&[("name", Value::Text("Biscotte".to_string()))]))
        .await?;
    drop(db);

    // Same pooled connection, so the second bootstrap runs against tables
    // that already exist.
    let db = Database::connect(
        dialect.clone(),
        &restaurant_schemas(),
        DatabaseOptions::new(),
        HookRegistry::new(),
    )
    .await?;
    let found = db
        .query(RESTAURANT)?
        .find_one(&Query::new().filter(Filter::eq("name", "Biscotte")))
        .await?;
    assert_eq!(found.map(|entity| entity.id), Some(created.id));
    Ok(())
}

#[tokio::test]
async fn the_table_prefix_reaches_the_physical_schema() -> Result<()> {
    let (dialect, db) = connect_with(
        &restaurant_schemas(),
        DatabaseOptions::new().with_table_prefix("myapp"),
        HookRegistry::new(),
    )
    .await?;
    assert_eq!(db.registry().get(RESTAURANT)?.table_name, "myapp_restaurants");

    let tables = table_names(&dialect).await?;
    assert!(tables.contains(&"myapp_restaurants".to_string()));
    assert!(tables.contains(&"myapp_owners".to_string()));
    Ok(())
}

#[tokio::test]
async fn unique_columns_get_a_physical_index() -> Result<()> {
    let (dialect, _db) = connect(&restaurant_schemas()).await?;
    let rows = dialect
        .query(&Statement::new(
            "SELECT \"name\" FROM sqlite_master WHERE \"type\" = 'index' AND \"name\" = 'restaurants_slug_uq'",
            Vec::new(),
        ))
        .await?;
    assert_eq!(rows.len(), 1);
    Ok(())
}
