//! Caller-facing operations on one content type.
//!
//! A [`Repository`] borrows the [`Database`] it came from, validates every
//! query before any SQL is generated, and runs lifecycle hooks around each
//! operation. Driver failures are wrapped with the operation name and the
//! content type uid so callers can tell which call on which type failed.

use tracing::debug;

use cormql::{Query, Value};

use crate::db::Database;
use crate::dialect::Executor;
use crate::entity::{Entity, EntityData};
use crate::error::{DatabaseError, Error, ValidationError};
use crate::hooks::{HookEvent, HookOperation, HookPhase};
use crate::metadata::{ContentTypeMetadata, RelationJoin, RelationMetadata};
use crate::query::mutate::{
    build_delete, build_fk_detach, build_fk_update, build_insert, build_join_attach,
    build_join_detach, build_morph_attach, build_morph_detach, build_update, MorphLink,
};
use crate::query::populate::populate_entities;
use crate::query::select::{build_count, build_select, select_columns};
use crate::query::validate::validate_query;
use crate::query::writer::SqlWriter;
use std::sync::Arc;

#[derive(Debug)]
pub struct Repository<'a> {
    pub(crate) db: &'a Database,
    pub(crate) metadata: Arc<ContentTypeMetadata>,
}

impl Repository<'_> {
    pub fn uid(&self) -> &str {
        &self.metadata.uid
    }

    /// All entities matching `query`, with requested relations populated.
    pub async fn find(&self, query: &Query) -> Result<Vec<Entity>, Error> {
        validate_query(self.db.registry(), &self.metadata, query)?;
        self.run_hooks(HookPhase::Before, HookOperation::FindMany, None, Some(query), None, None)
            .await?;
        let entities = self.fetch(query, "find").await?;
        self.run_hooks(HookPhase::After, HookOperation::FindMany, None, None, Some(&entities), None)
            .await?;
        Ok(entities)
    }

    /// First entity matching `query`, honoring its filter, order and offset.
    pub async fn find_one(&self, query: &Query) -> Result<Option<Entity>, Error> {
        validate_query(self.db.registry(), &self.metadata, query)?;
        self.run_hooks(HookPhase::Before, HookOperation::FindOne, None, Some(query), None, None)
            .await?;
        let mut limited = query.clone();
        limited.limit = Some(1);
        let entities = self.fetch(&limited, "find_one").await?;
        self.run_hooks(HookPhase::After, HookOperation::FindOne, None, None, Some(&entities), None)
            .await?;
        Ok(entities.into_iter().next())
    }

    /// Number of rows matching the query's filter. Pagination and populate
    /// are ignored; no hooks run.
    pub async fn count(&self, query: &Query) -> Result<u64, Error> {
        validate_query(self.db.registry(), &self.metadata, query)?;
        let executor = self.db.executor();
        let statement = build_count(executor.dialect(), &self.metadata, query)?;
        debug!("count({}) SQL: {}", self.metadata.uid, statement.sql);
        let rows = executor.query(&statement).await.map_err(|e| self.fail("count", e))?;
        let count = rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_integer())
            .ok_or_else(|| self.fail("count", DatabaseError::driver("count query returned no rows")))?;
        Ok(count.max(0) as u64)
    }

    /// Inserts `data` and returns the stored entity, re-read so the caller
    /// sees exactly what the engine keeps. Relation keys are rejected; links
    /// go through [`attach`](Repository::attach).
    pub async fn create(&self, mut data: EntityData) -> Result<Entity, Error> {
        self.run_hooks(HookPhase::Before, HookOperation::Create, Some(&mut data), None, None, None)
            .await?;
        let executor = self.db.executor();
        let statement = build_insert(executor.dialect(), &self.metadata, &data)?;
        debug!("create({}) SQL: {}", self.metadata.uid, statement.sql);
        let id = executor.insert(&statement).await.map_err(|e| self.fail("create", e))?;
        let entity = self
            .by_id(&executor, id)
            .await
            .map_err(|e| self.fail("create", e))?
            .ok_or_else(|| self.fail("create", DatabaseError::driver("inserted row not found")))?;
        self.run_hooks(
            HookPhase::After,
            HookOperation::Create,
            None,
            None,
            Some(std::slice::from_ref(&entity)),
            Some(1),
        )
        .await?;
        Ok(entity)
    }

    /// Updates the scalar fields in `data` on row `id`. Returns `None` when
    /// no row matched.
    pub async fn update(&self, id: i64, mut data: EntityData) -> Result<Option<Entity>, Error> {
        self.run_hooks(HookPhase::Before, HookOperation::Update, Some(&mut data), None, None, None)
            .await?;
        let executor = self.db.executor();
        let statement = build_update(executor.dialect(), &self.metadata, id, &data)?;
        debug!("update({}) SQL: {}", self.metadata.uid, statement.sql);
        let affected = executor.execute(&statement).await.map_err(|e| self.fail("update", e))?;
        if affected == 0 {
            self.run_hooks(HookPhase::After, HookOperation::Update, None, None, Some(&[]), Some(0))
                .await?;
            return Ok(None);
        }
        let entity = self.by_id(&executor, id).await.map_err(|e| self.fail("update", e))?;
        let seen = entity.as_ref().map(std::slice::from_ref).unwrap_or_default();
        self.run_hooks(HookPhase::After, HookOperation::Update, None, None, Some(seen), Some(affected))
            .await?;
        Ok(entity)
    }

    /// Deletes row `id` and returns how many rows went away (0 or 1). Link
    /// rows referencing it are removed by the engine's ON DELETE actions.
    pub async fn delete(&self, id: i64) -> Result<u64, Error> {
        self.run_hooks(HookPhase::Before, HookOperation::Delete, None, None, None, None).await?;
        let executor = self.db.executor();
        let statement = build_delete(executor.dialect(), &self.metadata, id);
        debug!("delete({}) SQL: {}", self.metadata.uid, statement.sql);
        let affected = executor.execute(&statement).await.map_err(|e| self.fail("delete", e))?;
        self.run_hooks(HookPhase::After, HookOperation::Delete, None, None, None, Some(affected))
            .await?;
        Ok(affected)
    }

    /// Connects `target_ids` to the relation `field` of entity `id`.
    ///
    /// Join-table relations append link rows after the current last position;
    /// column-backed relations rewrite the foreign key. Polymorphic relations
    /// need target types and go through [`attach_morph`](Repository::attach_morph).
    pub async fn attach(&self, id: i64, field: &str, target_ids: &[i64]) -> Result<(), Error> {
        let relation = self.relation(field)?;
        let executor = self.db.executor();
        let dialect = executor.dialect();
        let statement = match &relation.join {
            RelationJoin::SourceColumn { column } => {
                let target = match target_ids {
                    [] => return Ok(()),
                    [one] => *one,
                    _ => {
                        return Err(
                            self.link_error(field, "a to-one relation takes exactly one target")
                        )
                    }
                };
                build_fk_update(dialect, &self.metadata.table_name, column, Some(target), &[id])
            }
            RelationJoin::TargetColumn { column } => {
                if target_ids.is_empty() {
                    return Ok(());
                }
                let target = self.target_metadata(field, relation)?;
                build_fk_update(dialect, &target.table_name, column, Some(id), target_ids)
            }
            RelationJoin::JoinTable(jt) => {
                if target_ids.is_empty() {
                    return Ok(());
                }
                let order_base = match &jt.order_column {
                    Some(_) => {
                        self.link_count(&executor, &jt.table_name, &jt.source_column, id)
                            .await
                            .map_err(|e| self.fail("attach", e))? as f64
                    }
                    None => 0.0,
                };
                build_join_attach(dialect, jt, id, target_ids, order_base)
            }
            RelationJoin::MorphJoinTable(_) => {
                return Err(
                    self.link_error(field, "polymorphic targets need a type, use attach_morph")
                );
            }
            RelationJoin::MorphInverse { .. } => {
                return Err(self.link_error(field, "links are managed by the owning side"));
            }
        };
        debug!("attach({}.{}) SQL: {}", self.metadata.uid, field, statement.sql);
        executor.execute(&statement).await.map_err(|e| self.fail("attach", e))?;
        Ok(())
    }

    /// Disconnects targets from the relation `field` of entity `id`. An empty
    /// `target_ids` disconnects everything; to-one relations always clear
    /// their single link.
    pub async fn detach(&self, id: i64, field: &str, target_ids: &[i64]) -> Result<(), Error> {
        let relation = self.relation(field)?;
        let executor = self.db.executor();
        let dialect = executor.dialect();
        let statement = match &relation.join {
            RelationJoin::SourceColumn { column } => {
                build_fk_update(dialect, &self.metadata.table_name, column, None, &[id])
            }
            RelationJoin::TargetColumn { column } => {
                let target = self.target_metadata(field, relation)?;
                build_fk_detach(dialect, &target.table_name, column, id, target_ids)
            }
            RelationJoin::JoinTable(jt) => build_join_detach(dialect, jt, id, target_ids),
            RelationJoin::MorphJoinTable(mjt) => {
                if !target_ids.is_empty() {
                    return Err(
                        self.link_error(field, "polymorphic targets need a type, use detach_morph")
                    );
                }
                build_morph_detach(dialect, mjt, id, &[])
            }
            RelationJoin::MorphInverse { .. } => {
                return Err(self.link_error(field, "links are managed by the owning side"));
            }
        };
        debug!("detach({}.{}) SQL: {}", self.metadata.uid, field, statement.sql);
        executor.execute(&statement).await.map_err(|e| self.fail("detach", e))?;
        Ok(())
    }

    /// Connects `(target uid, id)` pairs to a polymorphic relation or dynamic
    /// zone, appended after the current last position. Targets outside the
    /// zone's allowed components are rejected before any SQL runs.
    pub async fn attach_morph(
        &self,
        id: i64,
        field: &str,
        targets: &[(String, i64)],
    ) -> Result<(), Error> {
        if targets.is_empty() {
            return Ok(());
        }
        let relation = self.relation(field)?;
        let RelationJoin::MorphJoinTable(mjt) = &relation.join else {
            return Err(self.link_error(field, "target types only apply to polymorphic relations"));
        };
        for (uid, _) in targets {
            let allowed = relation.targets.is_empty() || relation.targets.iter().any(|t| t == uid);
            if !allowed || !self.db.registry().contains(uid) {
                return Err(ValidationError::UnknownTarget {
                    uid: self.metadata.uid.clone(),
                    field: field.to_string(),
                    target: uid.clone(),
                }
                .into());
            }
        }
        let executor = self.db.executor();
        let order_base = match &mjt.order_column {
            Some(_) => {
                self.link_count(&executor, &mjt.table_name, &mjt.source_column, id)
                    .await
                    .map_err(|e| self.fail("attach", e))? as f64
            }
            None => 0.0,
        };
        let links: Vec<MorphLink> = targets
            .iter()
            .enumerate()
            .map(|(i, (uid, target_id))| MorphLink {
                source_id: id,
                target_uid: uid.clone(),
                target_id: *target_id,
                order: mjt.order_column.as_ref().map(|_| order_base + i as f64 + 1.0),
            })
            .collect();
        let statement = build_morph_attach(executor.dialect(), mjt, &links);
        debug!("attach({}.{}) SQL: {}", self.metadata.uid, field, statement.sql);
        executor.execute(&statement).await.map_err(|e| self.fail("attach", e))?;
        Ok(())
    }

    /// Disconnects `(target uid, id)` pairs from a polymorphic relation. An
    /// empty `targets` disconnects everything.
    pub async fn detach_morph(
        &self,
        id: i64,
        field: &str,
        targets: &[(String, i64)],
    ) -> Result<(), Error> {
        let relation = self.relation(field)?;
        let RelationJoin::MorphJoinTable(mjt) = &relation.join else {
            return Err(self.link_error(field, "target types only apply to polymorphic relations"));
        };
        let executor = self.db.executor();
        let statement = build_morph_detach(executor.dialect(), mjt, id, targets);
        debug!("detach({}.{}) SQL: {}", self.metadata.uid, field, statement.sql);
        executor.execute(&statement).await.map_err(|e| self.fail("detach", e))?;
        Ok(())
    }

    async fn fetch(&self, query: &Query, operation: &'static str) -> Result<Vec<Entity>, Error> {
        let executor = self.db.executor();
        let statement = build_select(executor.dialect(), &self.metadata, query)?;
        debug!(
            "{}({}) SQL: {} with {} params",
            operation,
            self.metadata.uid,
            statement.sql,
            statement.bindings.len()
        );
        let rows = executor.query(&statement).await.map_err(|e| self.fail(operation, e))?;
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            entities.push(
                Entity::from_row(&self.metadata, row).map_err(|e| self.fail(operation, e))?,
            );
        }
        populate_entities(&executor, self.db.registry(), &self.metadata, &mut entities, &query.populate)
            .await
            .map_err(|e| self.contextualize(operation, e))?;
        Ok(entities)
    }

    async fn by_id(&self, executor: &Executor<'_>, id: i64) -> Result<Option<Entity>, DatabaseError> {
        let dialect = executor.dialect();
        let mut writer = SqlWriter::new();
        writer
            .sql(format!(
                "SELECT {} FROM {} WHERE {} = ",
                select_columns(dialect, &self.metadata, None),
                dialect.quote_identifier(&self.metadata.table_name),
                dialect.quote_identifier("id")
            ))
            .bind(Value::Integer(id));
        let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;
        rows.into_iter().next().map(|row| Entity::from_row(&self.metadata, row)).transpose()
    }

    async fn link_count(
        &self,
        executor: &Executor<'_>,
        table: &str,
        source_column: &str,
        id: i64,
    ) -> Result<u64, DatabaseError> {
        let dialect = executor.dialect();
        let mut writer = SqlWriter::new();
        writer
            .sql(format!(
                "SELECT COUNT(*) AS {} FROM {} WHERE {} = ",
                dialect.quote_identifier("count"),
                dialect.quote_identifier(table),
                dialect.quote_identifier(source_column)
            ))
            .bind(Value::Integer(id));
        let rows = executor.query(&writer.collapse(dialect.paramstyle())).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_integer())
            .unwrap_or(0)
            .max(0) as u64)
    }

    async fn run_hooks(
        &self,
        phase: HookPhase,
        operation: HookOperation,
        mut data: Option<&mut EntityData>,
        query: Option<&Query>,
        entities: Option<&[Entity]>,
        affected: Option<u64>,
    ) -> Result<(), Error> {
        for hook in self.db.hooks().hooks_for(&self.metadata.uid, phase, operation) {
            hook.run(HookEvent {
                uid: &self.metadata.uid,
                phase,
                operation,
                data: data.as_deref_mut(),
                query,
                entities,
                affected,
            })
            .await?;
        }
        Ok(())
    }

    fn relation(&self, field: &str) -> Result<&RelationMetadata, Error> {
        Ok(self.metadata.relation(field).ok_or_else(|| ValidationError::NotARelation {
            uid: self.metadata.uid.clone(),
            field: field.to_string(),
        })?)
    }

    fn target_metadata(
        &self,
        field: &str,
        relation: &RelationMetadata,
    ) -> Result<Arc<ContentTypeMetadata>, Error> {
        let target_uid = relation.target_uid.as_deref().ok_or_else(|| {
            ValidationError::MissingTarget {
                uid: self.metadata.uid.clone(),
                field: field.to_string(),
            }
        })?;
        Ok(self.db.registry().get(target_uid)?.clone())
    }

    fn link_error(&self, field: &str, reason: &'static str) -> Error {
        ValidationError::LinkNotSupported {
            uid: self.metadata.uid.clone(),
            field: field.to_string(),
            reason,
        }
        .into()
    }

    fn fail(&self, operation: &'static str, source: DatabaseError) -> Error {
        Error::Database(DatabaseError::Operation {
            operation,
            uid: self.metadata.uid.clone(),
            source: Box::new(source),
        })
    }

    /// Wraps database failures coming out of multi-statement helpers;
    /// validation and hook failures pass through untouched.
    fn contextualize(&self, operation: &'static str, error: Error) -> Error {
        match error {
            Error::Database(source) => self.fail(operation, source),
            other => other,
        }
    }
}
