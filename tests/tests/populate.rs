
use anyhow::Result;
use common::*;
use corm::{AttributeSchema, ContentTypeSchema, Error, Population, RelationKind, ValidationError};
use cormql::{Filter, Query, Value};

#[tokio::test]
async fn many_to_many_population_keeps_attach_order() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    restaurants.create(data(&[("name", Value::Text("Lonely".to_string()))])).await?;
    let mut ids = Vec::new();
    for label in ["french", "brunch", "vegan"] {
        ids.push(categories.create(data(&[("label", Value::Text(label.to_string()))])).await?.id);
    }
    categories.create(data(&[("label", Value::Text("unlinked".to_string()))])).await?;

    restaurants.attach(biscotte.id, "categories", &[ids[2], ids[0], ids[1]]).await?;

    let found = restaurants
        .find(
            &Query::new()
                .filter(Filter::eq("name", "Biscotte"))
                .populate("categories", Query::new()),
        )
        .await?;
    let Some(Population::Many(linked)) = found[0].relation("categories") else {
        panic!("expected a populated list")
    };
    assert_eq!(
        linked.iter().map(|entity| entity.id).collect::<Vec<_>>(),
        vec![ids[2], ids[0], ids[1]]
    );

    // A parent without links still gets an explicit empty population.
    let lonely = restaurants
        .find(
            &Query::new()
                .filter(Filter::eq("name", "Lonely"))
                .populate("categories", Query::new()),
        )
        .await?;
    assert_eq!(lonely[0].relation("categories"), Some(&Population::Many(Vec::new())));
    Ok(())
}

#[tokio::test]
async fn the_inverse_side_sees_the_same_links() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let french = categories.create(data(&[("label", Value::Text("french".to_string()))])).await?;
    restaurants.attach(biscotte.id, "categories", &[french.id]).await?;

    let found = categories
        .find_one(
            &Query::new()
                .filter(Filter::eq("label", "french"))
                .populate("restaurants", Query::new()),
        )
        .await?
        .unwrap();
    let Some(Population::Many(linked)) = found.relation("restaurants") else {
        panic!("expected a populated list")
    };
    assert_eq!(linked.iter().map(|entity| entity.id).collect::<Vec<_>>(), vec![biscotte.id]);
    Ok(())
}

#[tokio::test]
async fn to_one_and_its_inverse_populate_both_directions() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let owners = db.query(OWNER)?;

    let marge = owners.create(data(&[("name", Value::Text("Marge".to_string()))])).await?;
    let first = restaurants.create(data(&[("name", Value::Text("First".to_string()))])).await?;
    let second = restaurants.create(data(&[("name", Value::Text("Second".to_string()))])).await?;
    restaurants.create(data(&[("name", Value::Text("Solo".to_string()))])).await?;
    owners.attach(marge.id, "restaurants", &[first.id, second.id]).await?;

    let found = restaurants
        .find_one(&Query::new().filter(Filter::eq("name", "First")).populate("owner", Query::new()))
        .await?
        .unwrap();
    let Some(Population::One(Some(owner))) = found.relation("owner") else {
        panic!("expected a populated owner")
    };
    assert_eq!(owner.id, marge.id);
    assert_eq!(owner.field("name"), Some(&Value::Text("Marge".to_string())));

    let unowned = restaurants
        .find_one(&Query::new().filter(Filter::eq("name", "Solo")).populate("owner", Query::new()))
        .await?
        .unwrap();
    assert_eq!(unowned.relation("owner"), Some(&Population::One(None)));

    let marge = owners
        .find_one(&Query::new().populate("restaurants", Query::new()))
        .await?
        .unwrap();
    let Some(Population::Many(mine)) = marge.relation("restaurants") else {
        panic!("expected a populated list")
    };
    assert_eq!(
        mine.iter().map(|entity| entity.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    Ok(())
}

#[tokio::test]
async fn nested_population_descends_through_relations() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;
    let owners = db.query(OWNER)?;

    let marge = owners.create(data(&[("name", Value::Text("Marge".to_string()))])).await?;
    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let french = categories.create(data(&[("label", Value::Text("french".to_string()))])).await?;
    owners.attach(marge.id, "restaurants", &[biscotte.id]).await?;
    restaurants.attach(biscotte.id, "categories", &[french.id]).await?;

    let found = owners
        .find_one(
            &Query::new()
                .populate("restaurants", Query::new().populate("categories", Query::new())),
        )
        .await?
        .unwrap();
    let Some(Population::Many(mine)) = found.relation("restaurants") else {
        panic!("expected populated restaurants")
    };
    let Some(Population::Many(cats)) = mine[0].relation("categories") else {
        panic!("expected populated categories")
    };
    assert_eq!(cats.iter().map(|entity| entity.id).collect::<Vec<_>>(), vec![french.id]);
    Ok(())
}

#[tokio::test]
async fn a_nested_filter_narrows_the_children() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let categories = db.query(CATEGORY)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let french = categories.create(data(&[("label", Value::Text("french".to_string()))])).await?;
    let brunch = categories.create(data(&[("label", Value::Text("brunch".to_string()))])).await?;
    restaurants.attach(biscotte.id, "categories", &[french.id, brunch.id]).await?;

    let found = restaurants
        .find_one(
            &Query::new()
                .populate("categories", Query::new().filter(Filter::eq("label", "brunch"))),
        )
        .await?
        .unwrap();
    let Some(Population::Many(linked)) = found.relation("categories") else {
        panic!("expected a populated list")
    };
    assert_eq!(linked.iter().map(|entity| entity.id).collect::<Vec<_>>(), vec![brunch.id]);
    Ok(())
}

#[tokio::test]
async fn single_components_populate_as_one() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let seos = db.query(SEO)?;

    let biscotte =
        restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let seo = seos.create(data(&[("title", Value::Text("Best biscuits".to_string()))])).await?;
    restaurants.attach(biscotte.id, "seo", &[seo.id]).await?;

    let found = restaurants
        .find_one(&Query::new().populate("seo", Query::new()))
        .await?
        .unwrap();
    let Some(Population::One(Some(attached))) = found.relation("seo") else {
        panic!("expected a populated component")
    };
    assert_eq!(attached.field("title"), Some(&Value::Text("Best biscuits".to_string())));
    Ok(())
}

#[tokio::test]
async fn dynamic_zones_keep_slot_order_across_target_tables() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let restaurants = db.query(RESTAURANT)?;
    let seos = db.query(SEO)?;
    let quotes = db.query(QUOTE)?;

    let page = restaurants.create(data(&[("name", Value::Text("Biscotte".to_string()))])).await?;
    let about = seos.create(data(&[("title", Value::Text("About".to_string()))])).await?;
    let opening = quotes.create(data(&[("body", Value::Text("first".to_string()))])).await?;
    let closing = quotes.create(data(&[("body", Value::Text("second".to_string()))])).await?;

    restaurants
        .attach_morph(
            page.id,
            "blocks",
            &[
                (QUOTE.to_string(), opening.id),
                (SEO.to_string(), about.id),
                (QUOTE.to_string(), closing.id),
            ],
        )
        .await?;

    let found = restaurants
        .find_one(&Query::new().populate("blocks", Query::new()))
        .await?
        .unwrap();
    let Some(Population::Many(blocks)) = found.relation("blocks") else {
        panic!("expected a populated zone")
    };
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].field("body"), Some(&Value::Text("first".to_string())));
    assert_eq!(blocks[1].field("title"), Some(&Value::Text("About".to_string())));
    assert_eq!(blocks[2].field("body"), Some(&Value::Text("second".to_string())));

    restaurants.detach_morph(page.id, "blocks", &[(QUOTE.to_string(), opening.id)]).await?;
    let found = restaurants
        .find_one(&Query::new().populate("blocks", Query::new()))
        .await?
        .unwrap();
    let Some(Population::Many(blocks)) = found.relation("blocks") else {
        panic!("expected a populated zone")
    };
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].field("title"), Some(&Value::Text("About".to_string())));
    assert_eq!(blocks[1].field("body"), Some(&Value::Text("second".to_string())));
    Ok(())
}

#[tokio::test]
async fn morph_inverses_walk_the_owning_join_table() -> Result<()> {
    let article_uid = "api::article.article";
    let image_uid = "api::image.image";
    let schemas = vec![
        ContentTypeSchema::new(article_uid, "articles")
            .attribute("title", AttributeSchema::string())
            .attribute(
                "images",
                AttributeSchema::Relation {
                    relation: RelationKind::MorphMany,
                    target: Some(image_uid.to_string()),
                    inversed_by: None,
                    mapped_by: None,
                    morph_by: Some("related".to_string()),
                },
            ),
        ContentTypeSchema::new(image_uid, "images")
            .attribute("caption", AttributeSchema::string())
            .attribute(
                "related",
                AttributeSchema::Relation {
                    relation: RelationKind::MorphToMany,
                    target: None,
                    inversed_by: None,
                    mapped_by: None,
                    morph_by: None,
                },
            ),
    ];
    let (_dialect, db) = connect(&schemas).await?;
    let articles = db.query(article_uid)?;
    let images = db.query(image_uid)?;

    let article = articles.create(data(&[("title", Value::Text("Opening".to_string()))])).await?;
    let hero = images.create(data(&[("caption", Value::Text("hero".to_string()))])).await?;
    let inline = images.create(data(&[("caption", Value::Text("inline".to_string()))])).await?;
    images.attach_morph(hero.id, "related", &[(article_uid.to_string(), article.id)]).await?;
    images.attach_morph(inline.id, "related", &[(article_uid.to_string(), article.id)]).await?;

    let found = articles
        .find_one(&Query::new().populate("images", Query::new()))
        .await?
        .unwrap();
    let Some(Population::Many(linked)) = found.relation("images") else {
        panic!("expected populated images")
    };
    assert_eq!(
        linked.iter().map(|entity| entity.id).collect::<Vec<_>>(),
        vec![hero.id, inline.id]
    );
    Ok(())
}

#[tokio::test]
async fn nested_pagination_is_rejected_before_any_sql() -> Result<()> {
    let (_dialect, db) = connect(&restaurant_schemas()).await?;
    let err = db
        .query(RESTAURANT)?
        .find(&Query::new().populate("categories", Query::new().limit(2)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::PopulatePagination { field }) if field == "categories"
    ));
    Ok(())
}
