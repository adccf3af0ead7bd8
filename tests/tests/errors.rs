
use std::sync::Arc;

use anyhow::Result;
use common::*;
use corm::{
    ConfigurationError, ContentTypeSchema, Database, DatabaseError, DatabaseOptions, Error,
    HookRegistry, ValidationError,
};
use cormql::{Filter, Query, SortItem, Value};
use corm_sqlite::{SqliteConfig, SqliteDialect};

#[tokio::test]
async fn duplicate_unique_values_report_the_violated_key() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    let payload = data(&[
        ("name", Value::Text("Biscotte".to_string())),
        ("slug", Value::Text("biscotte".to_string())),
    ]);
    repo.create(payload.clone()).await?;

    let err = repo.create(payload).await.unwrap_err();
    let Error::Database(outer) = err else {
        panic!("expected a database error, got {err:?}")
    };
    assert!(matches!(
        &outer,
        DatabaseError::Operation { operation: "create", uid, .. } if uid == RESTAURANT
    ));
    match outer.root() {
        DatabaseError::UniqueConstraint { constraint, .. } => {
            assert_eq!(constraint.as_deref(), Some("restaurants.slug"));
        }
        other => panic!("expected a unique constraint violation, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn bad_queries_fail_validation_before_any_sql() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;

    let err = repo.find(&Query::new().filter(Filter::eq("nope", 1))).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownField { .. })));

    let err = repo.find(&Query::new().order_by(SortItem::asc("categories"))).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MalformedFilter { .. })));

    let err = repo.find(&Query::new().filter(Filter::and(Vec::new()))).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MalformedFilter { .. })));

    let err = repo
        .find(&Query::new().filter(Filter::contains("rank", "3")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::OperatorNotSupported { .. })));
    Ok(())
}

#[tokio::test]
async fn unknown_uids_are_rejected_at_query_time() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let err = db.query("api::missing.missing").unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownContentType { .. })));
    Ok(())
}

#[tokio::test]
async fn an_invalid_table_prefix_fails_the_connect() -> Result<()> {
    let dialect = Arc::new(SqliteDialect::open_in_memory().await?);
    let err = Database::connect(
        dialect,
        &restaurant_schemas(),
        DatabaseOptions::new().with_table_prefix("waytoolongprefix"),
        HookRegistry::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::InvalidTablePrefix { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn colliding_collection_names_are_rejected_at_connect() -> Result<()> {
    let schemas = vec![
        ContentTypeSchema::new("api::page.page", "pages"),
        ContentTypeSchema::new("api::article.article", "pages"),
    ];
    let dialect = Arc::new(SqliteDialect::open_in_memory().await?);
    let err = Database::connect(dialect, &schemas, DatabaseOptions::new(), HookRegistry::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::DuplicateTableName { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn a_zero_connection_pool_is_refused() -> Result<()> {
    let err = SqliteDialect::connect(SqliteConfig { filename: None, pool_size: 0 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::MissingSetting { field: "pool_size" })
    ));
    Ok(())
}
