//! Batched relation population.
//!
//! Relations load through secondary queries keyed by parent ids, never by
//! joining into the primary SELECT, so populating can never multiply parent
//! rows. Every helper here ends the same way: each parent holds exactly its
//! related rows, in a deterministic order, with an empty population when
//! nothing matched.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use cormql::{Query, Value};

use crate::dialect::Executor;
use crate::entity::{Entity, Population};
use crate::error::{Error, ValidationError};
use crate::metadata::{
    ContentTypeMetadata, JoinTableMetadata, MetadataRegistry, MorphJoinTableMetadata, RelationJoin,
    RelationMetadata,
};
use crate::query::select::{order_by_sql, select_columns};
use crate::query::writer::{push_filter, qualified, SqlWriter};

/// Alias for the parent-id column smuggled into join-backed fetches. Two
/// leading underscores keep it out of the mapper's identifier space.
const PARENT_ALIAS: &str = "__parent";

pub(crate) fn populate_entities<'a>(
    executor: &'a Executor<'a>,
    registry: &'a MetadataRegistry,
    metadata: &'a ContentTypeMetadata,
    parents: &'a mut [Entity],
    populate: &'a BTreeMap<String, Query>,
) -> BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move {
        if parents.is_empty() || populate.is_empty() {
            return Ok(());
        }
        for (field, nested) in populate {
            let relation =
                metadata.relation(field).ok_or_else(|| ValidationError::NotARelation {
                    uid: metadata.uid.clone(),
                    field: field.clone(),
                })?;
            seed(parents, field, relation.many);
            match &relation.join {
                RelationJoin::SourceColumn { column } => {
                    populate_source_column(
                        executor, registry, metadata, parents, field, relation, column, nested,
                    )
                    .await?
                }
                RelationJoin::TargetColumn { column } => {
                    populate_target_column(
                        executor, registry, metadata, parents, field, relation, column, nested,
                    )
                    .await?
                }
                RelationJoin::JoinTable(jt) => {
                    populate_join_table(
                        executor, registry, metadata, parents, field, relation, jt, nested,
                    )
                    .await?
                }
                RelationJoin::MorphJoinTable(mjt) => {
                    populate_morph_join_table(executor, registry, parents, field, mjt).await?
                }
                RelationJoin::MorphInverse { owner_attribute } => {
                    populate_morph_inverse(
                        executor,
                        registry,
                        metadata,
                        parents,
                        field,
                        relation,
                        owner_attribute,
                        nested,
                    )
                    .await?
                }
            }
        }
        Ok(())
    })
}

fn seed(parents: &mut [Entity], field: &str, many: bool) {
    for parent in parents.iter_mut() {
        let empty = if many { Population::Many(Vec::new()) } else { Population::One(None) };
        parent.relations.insert(field.to_string(), empty);
    }
}

fn parent_index(parents: &[Entity]) -> BTreeMap<i64, usize> {
    parents.iter().enumerate().map(|(i, parent)| (parent.id, i)).collect()
}

fn assign(
    parents: &mut [Entity],
    index: &BTreeMap<i64, usize>,
    field: &str,
    parent_id: i64,
    child: Entity,
) {
    let Some(&at) = index.get(&parent_id) else { return };
    match parents[at].relations.get_mut(field) {
        Some(Population::Many(children)) => children.push(child),
        Some(Population::One(slot)) => {
            if slot.is_none() {
                *slot = Some(child);
            }
        }
        None => {}
    }
}

fn push_id_list(writer: &mut SqlWriter, ids: &[i64]) {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            writer.sql(", ");
        }
        writer.bind(Value::Integer(*id));
    }
}

fn target_of<'r>(
    registry: &'r MetadataRegistry,
    uid: &str,
    field: &str,
    relation: &RelationMetadata,
) -> Result<&'r Arc<ContentTypeMetadata>, Error> {
    let target_uid = relation.target_uid.as_deref().ok_or_else(|| {
        ValidationError::MissingTarget { uid: uid.to_string(), field: field.to_string() }
    })?;
    Ok(registry.get(target_uid)?)
}

/// Owning to-one: read the parents' foreign keys, then fetch the distinct
/// targets in one go and hand each parent a copy of its row.
#[allow(clippy::too_many_arguments)]
async fn populate_source_column(
    executor: &Executor<'_>,
    registry: &MetadataRegistry,
    metadata: &ContentTypeMetadata,
    parents: &mut [Entity],
    field: &str,
    relation: &RelationMetadata,
    column: &str,
    nested: &Query,
) -> Result<(), Error> {
    let target = target_of(registry, &metadata.uid, field, relation)?.clone();
    let dialect = executor.dialect();
    let ids: Vec<i64> = parents.iter().map(|parent| parent.id).collect();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {}, {} FROM {} WHERE {} IN (",
        dialect.quote_identifier("id"),
        dialect.quote_identifier(column),
        dialect.quote_identifier(&metadata.table_name),
        dialect.quote_identifier("id")
    ));
    push_id_list(&mut writer, &ids);
    writer.sql(")");
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut fk_of: BTreeMap<i64, i64> = BTreeMap::new();
    for mut row in rows {
        let parent_id = row.remove("id").and_then(|v| v.as_integer());
        let fk = row.remove(column).and_then(|v| v.as_integer());
        if let (Some(parent_id), Some(fk)) = (parent_id, fk) {
            fk_of.insert(parent_id, fk);
        }
    }
    if fk_of.is_empty() {
        return Ok(());
    }

    let mut target_ids: Vec<i64> = fk_of.values().copied().collect();
    target_ids.sort_unstable();
    target_ids.dedup();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {} FROM {} WHERE {} IN (",
        select_columns(dialect, &target, None),
        dialect.quote_identifier(&target.table_name),
        dialect.quote_identifier("id")
    ));
    push_id_list(&mut writer, &target_ids);
    writer.sql(")");
    if let Some(filter) = &nested.filter {
        writer.sql(" AND (");
        push_filter(&mut writer, dialect, &target, None, filter)?;
        writer.sql(")");
    }
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut children = Vec::with_capacity(rows.len());
    for row in rows {
        children.push(Entity::from_row(&target, row)?);
    }
    populate_entities(executor, registry, &target, &mut children, &nested.populate).await?;

    let by_id: BTreeMap<i64, Entity> = children.into_iter().map(|c| (c.id, c)).collect();
    let index = parent_index(parents);
    for (parent_id, fk) in fk_of {
        if let Some(child) = by_id.get(&fk) {
            assign(parents, &index, field, parent_id, child.clone());
        }
    }
    Ok(())
}

/// Inverse side held by a column on the target table: one query with the
/// foreign key selected alongside, grouped back onto the parents.
#[allow(clippy::too_many_arguments)]
async fn populate_target_column(
    executor: &Executor<'_>,
    registry: &MetadataRegistry,
    metadata: &ContentTypeMetadata,
    parents: &mut [Entity],
    field: &str,
    relation: &RelationMetadata,
    column: &str,
    nested: &Query,
) -> Result<(), Error> {
    let target = target_of(registry, &metadata.uid, field, relation)?.clone();
    let dialect = executor.dialect();
    let ids: Vec<i64> = parents.iter().map(|parent| parent.id).collect();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {}, {} FROM {} WHERE {} IN (",
        select_columns(dialect, &target, None),
        dialect.quote_identifier(column),
        dialect.quote_identifier(&target.table_name),
        dialect.quote_identifier(column)
    ));
    push_id_list(&mut writer, &ids);
    writer.sql(")");
    if let Some(filter) = &nested.filter {
        writer.sql(" AND (");
        push_filter(&mut writer, dialect, &target, None, filter)?;
        writer.sql(")");
    }
    writer.sql(order_by_sql(dialect, &target, None, &nested.order_by)?);
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut children = Vec::with_capacity(rows.len());
    let mut owners = Vec::with_capacity(rows.len());
    for mut row in rows {
        let Some(parent_id) = row.remove(column).and_then(|v| v.as_integer()) else { continue };
        children.push(Entity::from_row(&target, row)?);
        owners.push(parent_id);
    }
    populate_entities(executor, registry, &target, &mut children, &nested.populate).await?;

    let index = parent_index(parents);
    for (parent_id, child) in owners.into_iter().zip(children) {
        assign(parents, &index, field, parent_id, child);
    }
    Ok(())
}

/// Join-table relations (many-to-many and components): inner join through
/// the link table, ordered by the nested sort, the link order column, or the
/// link row id, in that priority.
#[allow(clippy::too_many_arguments)]
async fn populate_join_table(
    executor: &Executor<'_>,
    registry: &MetadataRegistry,
    metadata: &ContentTypeMetadata,
    parents: &mut [Entity],
    field: &str,
    relation: &RelationMetadata,
    jt: &JoinTableMetadata,
    nested: &Query,
) -> Result<(), Error> {
    let target = target_of(registry, &metadata.uid, field, relation)?.clone();
    let dialect = executor.dialect();
    let ids: Vec<i64> = parents.iter().map(|parent| parent.id).collect();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {}, {} AS {} FROM {} {} INNER JOIN {} {} ON {} = {} WHERE {} IN (",
        select_columns(dialect, &target, Some("t")),
        qualified(dialect, Some("j"), &jt.source_column),
        dialect.quote_identifier(PARENT_ALIAS),
        dialect.quote_identifier(&jt.table_name),
        dialect.quote_identifier("j"),
        dialect.quote_identifier(&target.table_name),
        dialect.quote_identifier("t"),
        qualified(dialect, Some("t"), "id"),
        qualified(dialect, Some("j"), &jt.target_column),
        qualified(dialect, Some("j"), &jt.source_column)
    ));
    push_id_list(&mut writer, &ids);
    writer.sql(")");
    if let Some(filter) = &nested.filter {
        writer.sql(" AND (");
        push_filter(&mut writer, dialect, &target, Some("t"), filter)?;
        writer.sql(")");
    }
    if !nested.order_by.is_empty() {
        writer.sql(order_by_sql(dialect, &target, Some("t"), &nested.order_by)?);
    } else if let Some(order) = &jt.order_column {
        writer.sql(format!(
            " ORDER BY {} ASC, {} ASC",
            qualified(dialect, Some("j"), order),
            qualified(dialect, Some("j"), "id")
        ));
    } else {
        writer.sql(format!(" ORDER BY {} ASC", qualified(dialect, Some("j"), "id")));
    }
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut children = Vec::with_capacity(rows.len());
    let mut owners = Vec::with_capacity(rows.len());
    for mut row in rows {
        let Some(parent_id) = row.remove(PARENT_ALIAS).and_then(|v| v.as_integer()) else {
            continue;
        };
        children.push(Entity::from_row(&target, row)?);
        owners.push(parent_id);
    }
    populate_entities(executor, registry, &target, &mut children, &nested.populate).await?;

    let index = parent_index(parents);
    for (parent_id, child) in owners.into_iter().zip(children) {
        assign(parents, &index, field, parent_id, child);
    }
    Ok(())
}

/// Polymorphic owners (morph-to relations and dynamic zones): read the link
/// rows, group targets by their type discriminator, fetch per target table,
/// then reassemble in link order. Rows pointing at types the registry does
/// not know are skipped with a warning.
async fn populate_morph_join_table(
    executor: &Executor<'_>,
    registry: &MetadataRegistry,
    parents: &mut [Entity],
    field: &str,
    mjt: &MorphJoinTableMetadata,
) -> Result<(), Error> {
    let dialect = executor.dialect();
    let ids: Vec<i64> = parents.iter().map(|parent| parent.id).collect();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {}, {}, {} FROM {} WHERE {} IN (",
        dialect.quote_identifier(&mjt.source_column),
        dialect.quote_identifier(&mjt.target_type_column),
        dialect.quote_identifier(&mjt.target_id_column),
        dialect.quote_identifier(&mjt.table_name),
        dialect.quote_identifier(&mjt.source_column)
    ));
    push_id_list(&mut writer, &ids);
    writer.sql(")");
    match &mjt.order_column {
        Some(order) => writer.sql(format!(
            " ORDER BY {} ASC, {} ASC",
            dialect.quote_identifier(order),
            dialect.quote_identifier("id")
        )),
        None => writer.sql(format!(" ORDER BY {} ASC", dialect.quote_identifier("id"))),
    };
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut links = Vec::with_capacity(rows.len());
    for mut row in rows {
        let parent_id = row.remove(mjt.source_column.as_str()).and_then(|v| v.as_integer());
        let target_id = row.remove(mjt.target_id_column.as_str()).and_then(|v| v.as_integer());
        let target_uid = match row.remove(mjt.target_type_column.as_str()) {
            Some(Value::Text(uid)) => Some(uid),
            _ => None,
        };
        if let (Some(parent_id), Some(uid), Some(target_id)) = (parent_id, target_uid, target_id) {
            links.push((parent_id, uid, target_id));
        }
    }

    let mut by_type: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for (_, uid, target_id) in &links {
        by_type.entry(uid.as_str()).or_default().push(*target_id);
    }

    let mut fetched: BTreeMap<(String, i64), Entity> = BTreeMap::new();
    for (uid, mut target_ids) in by_type {
        let Ok(target) = registry.get(uid) else {
            warn!("Skipping unknown polymorphic target type: {}", uid);
            continue;
        };
        target_ids.sort_unstable();
        target_ids.dedup();

        let mut writer = SqlWriter::new();
        writer.sql(format!(
            "SELECT {} FROM {} WHERE {} IN (",
            select_columns(dialect, target, None),
            dialect.quote_identifier(&target.table_name),
            dialect.quote_identifier("id")
        ));
        push_id_list(&mut writer, &target_ids);
        writer.sql(")");
        let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;
        for row in rows {
            let entity = Entity::from_row(target, row)?;
            fetched.insert((uid.to_string(), entity.id), entity);
        }
    }

    let index = parent_index(parents);
    for (parent_id, uid, target_id) in links {
        if let Some(child) = fetched.get(&(uid, target_id)) {
            assign(parents, &index, field, parent_id, child.clone());
        }
    }
    Ok(())
}

/// Inverse of a polymorphic relation: walk the owner's link table backwards,
/// matching our uid in the type discriminator.
#[allow(clippy::too_many_arguments)]
async fn populate_morph_inverse(
    executor: &Executor<'_>,
    registry: &MetadataRegistry,
    metadata: &ContentTypeMetadata,
    parents: &mut [Entity],
    field: &str,
    relation: &RelationMetadata,
    owner_attribute: &str,
    nested: &Query,
) -> Result<(), Error> {
    let owner = target_of(registry, &metadata.uid, field, relation)?.clone();
    let partner = format!("{}.{}", owner.uid, owner_attribute);
    let owner_relation = owner.relation(owner_attribute).ok_or_else(|| {
        ValidationError::InvalidInverse {
            uid: metadata.uid.clone(),
            field: field.to_string(),
            partner: partner.clone(),
            reason: "owner attribute is missing",
        }
    })?;
    let RelationJoin::MorphJoinTable(mjt) = &owner_relation.join else {
        return Err(ValidationError::InvalidInverse {
            uid: metadata.uid.clone(),
            field: field.to_string(),
            partner,
            reason: "owner attribute is not polymorphic",
        }
        .into());
    };

    let dialect = executor.dialect();
    let ids: Vec<i64> = parents.iter().map(|parent| parent.id).collect();

    let mut writer = SqlWriter::new();
    writer.sql(format!(
        "SELECT {}, {} AS {} FROM {} {} INNER JOIN {} {} ON {} = {} WHERE {} = ",
        select_columns(dialect, &owner, Some("t")),
        qualified(dialect, Some("j"), &mjt.target_id_column),
        dialect.quote_identifier(PARENT_ALIAS),
        dialect.quote_identifier(&mjt.table_name),
        dialect.quote_identifier("j"),
        dialect.quote_identifier(&owner.table_name),
        dialect.quote_identifier("t"),
        qualified(dialect, Some("t"), "id"),
        qualified(dialect, Some("j"), &mjt.source_column),
        qualified(dialect, Some("j"), &mjt.target_type_column)
    ));
    writer.bind(Value::Text(metadata.uid.clone()));
    writer.sql(format!(" AND {} IN (", qualified(dialect, Some("j"), &mjt.target_id_column)));
    push_id_list(&mut writer, &ids);
    writer.sql(")");
    if let Some(filter) = &nested.filter {
        writer.sql(" AND (");
        push_filter(&mut writer, dialect, &owner, Some("t"), filter)?;
        writer.sql(")");
    }
    if !nested.order_by.is_empty() {
        writer.sql(order_by_sql(dialect, &owner, Some("t"), &nested.order_by)?);
    } else {
        match &mjt.order_column {
            Some(order) => writer.sql(format!(
                " ORDER BY {} ASC, {} ASC",
                qualified(dialect, Some("j"), order),
                qualified(dialect, Some("j"), "id")
            )),
            None => writer.sql(format!(" ORDER BY {} ASC", qualified(dialect, Some("j"), "id"))),
        };
    }
    let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;

    let mut children = Vec::with_capacity(rows.len());
    let mut owners = Vec::with_capacity(rows.len());
    for mut row in rows {
        let Some(parent_id) = row.remove(PARENT_ALIAS).and_then(|v| v.as_integer()) else {
            continue;
        };
        children.push(Entity::from_row(&owner, row)?);
        owners.push(parent_id);
    }
    populate_entities(executor, registry, &owner, &mut children, &nested.populate).await?;

    let index = parent_index(parents);
    for (parent_id, child) in owners.into_iter().zip(children) {
        assign(parents, &index, field, parent_id, child);
    }
    Ok(())
}
