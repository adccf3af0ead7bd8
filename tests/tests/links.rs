
use anyhow::Result;
use common::*;
use corm::core::metadata::RelationJoin;
use corm::{Dialect, Error, Population, Statement, ValidationError};
use cormql::{Filter, Query, Value};

#[tokio::test]
async fn detach_removes_only_the_named_targets() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let mut ids = Vec::new();
    for label in ["french", "brunch", "vegan"] {
        ids.push(categories.create(data(&[("label", Value::Text(label.to_string()))])).await?.id);
    }
    restaurants.attach(biscotte.id, "categories", &ids).await?;

    restaurants.detach(biscotte.id, "categories", &[ids[1]]).await?;
    let populated = Query::new().populate("categories", Query::new());
    let found = restaurants.find_one(&populated).await?.unwrap();
    let Some(Population::Many(linked)) = found.relation("categories") else {
        panic!("expected a populated list")
    };
    assert_eq!(linked.iter().map(|entity| entity.id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);

    // No targets means drop every link.
    restaurants.detach(biscotte.id, "categories", &[]).await?;
    let found = restaurants.find_one(&populated).await?.unwrap();
    assert_eq!(found.relation("categories"), Some(&Population::Many(Vec::new())));
    Ok(())
}

#[tokio::test]
async fn a_to_one_link_is_replaced_not_appended() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let owners = db.query(OWNER)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let marge = owners.create(data(&[("name", Value::Text("Marge".to_string()))])).await?;
    let homer = owners.create(data(&[("name", Value::Text("Homer".to_string()))])).await?;

    restaurants.attach(biscotte.id, "owner", &[marge.id]).await?;
    restaurants.attach(biscotte.id, "owner", &[homer.id]).await?;

    let populated = Query::new().populate("owner", Query::new());
    let found = restaurants.find_one(&populated).await?.unwrap();
    let Some(Population::One(Some(owner))) = found.relation("owner") else {
        panic!("expected a populated owner")
    };
    assert_eq!(owner.id, homer.id);

    let err = restaurants.attach(biscotte.id, "owner", &[marge.id, homer.id]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::LinkNotSupported { .. })));

    restaurants.detach(biscotte.id, "owner", &[]).await?;
    let found = restaurants.find_one(&populated).await?.unwrap();
    assert_eq!(found.relation("owner"), Some(&Population::One(None)));
    Ok(())
}

#[tokio::test]
async fn one_to_many_links_rewrite_the_fk_on_the_target_side() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let owners = db.query(OWNER)?;

    let marge = owners.create(data(&[("name", Value::Text("Marge".to_string()))])).await?;
    let first = restaurants.create(data(&[("name", Value::Text("First".to_string()))])).await?;
    let second = restaurants.create(data(&[("name", Value::Text("Second".to_string()))])).await?;

    owners.attach(marge.id, "restaurants", &[first.id, second.id]).await?;
    let found = restaurants
        .find_one(&Query::new().filter(Filter::eq("name", "First")).populate("owner", Query::new()))
        .await?
        .unwrap();
    let Some(Population::One(Some(owner))) = found.relation("owner") else {
        panic!("expected a populated owner")
    };
    assert_eq!(owner.id, marge.id);

    owners.detach(marge.id, "restaurants", &[first.id]).await?;
    let found = owners
        .find_one(&Query::new().populate("restaurants", Query::new()))
        .await?
        .unwrap();
    let Some(Population::Many(mine)) = found.relation("restaurants") else {
        panic!("expected a populated list")
    };
    assert_eq!(mine.iter().map(|entity| entity.id).collect::<Vec<_>>(), vec![second.id]);
    Ok(())
}

#[tokio::test]
async fn polymorphic_links_demand_target_types() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let quotes = db.query(QUOTE)?;

    let page = restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let quote = quotes.create(data(&[("body", Value::Text("hello".to_string()))])).await?;

    let err = restaurants.attach(page.id, "blocks", &[quote.id]).await.unwrap_err();
    let Error::Validation(ValidationError::LinkNotSupported { reason, .. }) = err else {
        panic!("expected a link error, got {err:?}")
    };
    assert!(reason.contains("attach_morph"));

    let err = restaurants.detach(page.id, "blocks", &[quote.id]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::LinkNotSupported { .. })));

    let err = restaurants
        .attach_morph(page.id, "categories", &[(CATEGORY.to_string(), 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::LinkNotSupported { .. })));

    let err = restaurants
        .attach_morph(page.id, "blocks", &[("api::nope.nope".to_string(), quote.id)])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownTarget { .. })));

    // Registered, but not one of the zone's allowed components.
    let err = restaurants
        .attach_morph(page.id, "blocks", &[(CATEGORY.to_string(), 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownTarget { .. })));

    // Clearing the zone without naming targets is always allowed.
    restaurants.detach(page.id, "blocks", &[]).await?;
    Ok(())
}

#[tokio::test]
async fn deleting_a_parent_cascades_its_link_rows() -> Result<()> {
    let (dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let mut ids = Vec::new();
    for label in ["french", "brunch"] {
        ids.push(categories.create(data(&[("label", Value::Text(label.to_string()))])).await?.id);
    }
    restaurants.attach(biscotte.id, "categories", &ids).await?;

    let metadata = db.registry().get(RESTAURANT)?.clone();
    let relation = metadata.relation("categories").unwrap();
    let RelationJoin::JoinTable(jt) = &relation.join else { panic!("expected a join table") };

    restaurants.delete(biscotte.id).await?;
    let rows = dialect
        .query(&Statement::new(
            format!("SELECT COUNT(*) AS \"n\" FROM \"{}\"", jt.table_name),
            Vec::new(),
        ))
        .await?;
    assert_eq!(rows[0]["n"], Value::Integer(0));

    // The linked categories themselves survive.
    assert_eq!(categories.count(&Query::new()).await?, 2);
    Ok(())
}
