
use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use common::*;
use corm::{EntityData, Error, ValidationError};
use cormql::{Filter, Query, SortItem, Value};

#[tokio::test]
async fn stored_values_round_trip() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;

    let opened = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
    let visited = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    let entity = repo
        .create(data(&[
            ("name", Value::Text("Biscotte".to_string())),
            ("slug", Value::Text("biscotte".to_string())),
            ("rank", Value::Integer(3)),
            ("isOpen", Value::Bool(true)),
            ("openedOn", Value::Date(opened)),
            ("visitedAt", Value::DateTime(visited)),
            ("settings", Value::Json(serde_json::json!({"tables": 12}))),
        ]))
        .await?;

    assert!(entity.id >= 1);
    assert_eq!(entity.field("name"), Some(&Value::Text("Biscotte".to_string())));
    assert_eq!(entity.field("rank"), Some(&Value::Integer(3)));
    assert_eq!(entity.field("isOpen"), Some(&Value::Bool(true)));
    assert_eq!(entity.field("openedOn"), Some(&Value::Date(opened)));
    assert_eq!(entity.field("visitedAt"), Some(&Value::DateTime(visited)));
    assert_eq!(
        entity.field("settings"),
        Some(&Value::Json(serde_json::json!({"tables": 12})))
    );
    Ok(())
}

#[tokio::test]
async fn unset_attributes_read_back_as_null() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;

    let entity = repo.create(data(&[("name", Value::Text("Oliva".to_string()))])).await?;
    assert_eq!(entity.field("rank"), Some(&Value::Null));
    assert_eq!(entity.field("isOpen"), Some(&Value::Null));
    Ok(())
}

#[tokio::test]
async fn filters_compose_against_the_engine() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    for (name, rank) in [("Biscotte", 1), ("Oliva", 2), ("Charlotte", 8)] {
        repo.create(data(&[
            ("name", Value::Text(name.to_string())),
            ("rank", Value::Integer(rank)),
        ]))
        .await?;
    }

    let and = Query::new()
        .filter(Filter::and(vec![Filter::gte("rank", 2), Filter::contains("name", "li")]));
    let found = repo.find(&and).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].field("name"), Some(&Value::Text("Oliva".to_string())));

    let or = Query::new()
        .filter(Filter::or(vec![Filter::eq("name", "Biscotte"), Filter::gt("rank", 5)]));
    assert_eq!(repo.find(&or).await?.len(), 2);

    assert_eq!(repo.count(&Query::new().filter(Filter::between("rank", 1, 2))).await?, 2);

    let within = Filter::is_in(
        "name",
        vec![Value::Text("Oliva".to_string()), Value::Text("Nowhere".to_string())],
    );
    assert_eq!(repo.count(&Query::new().filter(within)).await?, 1);
    Ok(())
}

#[tokio::test]
async fn null_checks_see_missing_values() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    repo.create(data(&[
        ("name", Value::Text("Biscotte".to_string())),
        ("slug", Value::Text("biscotte".to_string())),
    ]))
    .await?;
    repo.create(data(&[("name", Value::Text("Oliva".to_string()))])).await?;

    let unslugged = repo.find(&Query::new().filter(Filter::null("slug"))).await?;
    assert_eq!(unslugged.len(), 1);
    assert_eq!(unslugged[0].field("name"), Some(&Value::Text("Oliva".to_string())));

    let slugged = repo.find(&Query::new().filter(Filter::not_null("slug"))).await?;
    assert_eq!(slugged.len(), 1);
    Ok(())
}

#[tokio::test]
async fn pagination_is_stable_under_equal_sort_keys() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    for i in 0..5 {
        repo.create(data(&[
            ("name", Value::Text(format!("r{i}"))),
            ("rank", Value::Integer(7)),
        ]))
        .await?;
    }

    // Every row carries the same rank; only the implicit id tiebreak keeps
    // the pages disjoint and repeatable.
    let page = Query::new().order_by(SortItem::desc("rank")).limit(2).offset(2);
    let first_read: Vec<i64> = repo.find(&page).await?.iter().map(|entity| entity.id).collect();
    let second_read: Vec<i64> = repo.find(&page).await?.iter().map(|entity| entity.id).collect();
    assert_eq!(first_read, second_read);
    assert_eq!(first_read.len(), 2);

    let mut all = Vec::new();
    for offset in [0, 2, 4] {
        let q = Query::new().order_by(SortItem::desc("rank")).limit(2).offset(offset);
        all.extend(repo.find(&q).await?.into_iter().map(|entity| entity.id));
    }
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 5);
    Ok(())
}

#[tokio::test]
async fn an_offset_without_a_limit_skips_rows() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    for rank in [1, 2, 3] {
        repo.create(data(&[
            ("name", Value::Text(format!("r{rank}"))),
            ("rank", Value::Integer(rank)),
        ]))
        .await?;
    }

    let found = repo.find(&Query::new().order_by(SortItem::asc("rank")).offset(1)).await?;
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].field("rank"), Some(&Value::Integer(2)));
    Ok(())
}

#[tokio::test]
async fn find_one_takes_the_first_row_of_the_order() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    repo.create(data(&[
        ("name", Value::Text("Biscotte".to_string())),
        ("rank", Value::Integer(1)),
    ]))
    .await?;
    repo.create(data(&[
        ("name", Value::Text("Oliva".to_string())),
        ("rank", Value::Integer(2)),
    ]))
    .await?;

    let first = repo.find_one(&Query::new().order_by(SortItem::desc("rank"))).await?;
    assert_eq!(first.unwrap().field("name"), Some(&Value::Text("Oliva".to_string())));

    let none = repo.find_one(&Query::new().filter(Filter::eq("name", "Nowhere"))).await?;
    assert!(none.is_none());
    Ok(())
}

#[tokio::test]
async fn count_ignores_pagination() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    for i in 0..3 {
        repo.create(data(&[("name", Value::Text(format!("r{i}")))])).await?;
    }
    assert_eq!(repo.count(&Query::new().limit(1).offset(2)).await?, 3);
    Ok(())
}

#[tokio::test]
async fn update_touches_only_the_named_fields() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    let entity = repo
        .create(data(&[
            ("name", Value::Text("Biscotte".to_string())),
            ("rank", Value::Integer(3)),
        ]))
        .await?;

    let updated = repo.update(entity.id, data(&[("rank", Value::Integer(9))])).await?;
    let updated = updated.unwrap();
    assert_eq!(updated.field("rank"), Some(&Value::Integer(9)));
    assert_eq!(updated.field("name"), Some(&Value::Text("Biscotte".to_string())));

    let missing = repo.update(entity.id + 100, data(&[("rank", Value::Integer(1))])).await?;
    assert!(missing.is_none());
    Ok(())
}

#[tokio::test]
async fn delete_reports_affected_rows() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;
    let entity = repo.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;

    assert_eq!(repo.delete(entity.id).await?, 1);
    assert_eq!(repo.delete(entity.id).await?, 0);
    assert_eq!(repo.count(&Query::new()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn write_payloads_reject_ids_and_relation_keys() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let repo = db.query(RESTAURANT)?;

    let err = repo.create(data(&[("id", Value::Integer(1))])).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = repo.create(data(&[("categories", Value::Integer(1))])).await.unwrap_err();
    let Error::Validation(ValidationError::InvalidPayload { reason }) = err else {
        panic!("expected a validation error, got {err:?}")
    };
    assert!(reason.contains("attach"));

    let entity = repo.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let err = repo.update(entity.id, EntityData::new()).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidPayload { .. })));
    Ok(())
}
