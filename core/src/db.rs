//! The connected database handle.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DatabaseOptions;
use crate::ddl::bootstrap_statements;
use crate::dialect::{Dialect, Executor};
use crate::error::Error;
use crate::hooks::HookRegistry;
use crate::mapper::compile;
use crate::metadata::MetadataRegistry;
use crate::repository::Repository;
use crate::schema::ContentTypeSchema;

/// A dialect plus the metadata compiled for it. Everything inside is
/// read-only after [`connect`](Database::connect), so the handle can be
/// shared freely behind an `Arc`.
pub struct Database {
    dialect: Arc<dyn Dialect>,
    registry: MetadataRegistry,
    hooks: HookRegistry,
    options: DatabaseOptions,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.name())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Validates `options`, compiles `schemas` against the dialect's
    /// identifier budget, and creates any missing tables and indexes. The
    /// bootstrap DDL is idempotent; existing tables are left as they are.
    pub async fn connect(
        dialect: Arc<dyn Dialect>,
        schemas: &[ContentTypeSchema],
        options: DatabaseOptions,
        hooks: HookRegistry,
    ) -> Result<Database, Error> {
        options.validate()?;
        let registry = compile(schemas, &options, dialect.max_identifier_length())?;

        let info = dialect.database_info().await;
        info!("Connected to {} {} ({} content types)", info.engine, info.version, registry.len());

        let db = Database { dialect, registry, hooks, options };
        let executor = db.executor();
        for statement in bootstrap_statements(&db.registry, executor.dialect()) {
            debug!("Bootstrap DDL: {}", statement.sql);
            executor.execute(&statement).await?;
        }
        Ok(db)
    }

    /// Repository for one content type, by uid.
    pub fn query(&self, uid: &str) -> Result<Repository<'_>, Error> {
        let metadata = self.registry.get(uid)?.clone();
        Ok(Repository { db: self, metadata })
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    pub(crate) fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub(crate) fn executor(&self) -> Executor<'_> {
        Executor::new(self.dialect.as_ref(), self.options.statement_timeout)
    }
}
