//! # Corm
//!
//! Corm is a schema-driven database layer: content types are declared as
//! data, compiled into physical table metadata, and served through typed
//! repositories over interchangeable SQL engines.
//!
//! ## Key Features
//!
//! - **Schema-First Design**: Content types arrive as declarative schemas
//!   (typically JSON) and compile deterministically into tables, join tables
//!   and foreign keys
//! - **Engine Portability**: One query layer over embedded SQLite and
//!   client/server Postgres, with engine differences expressed as dialect
//!   capabilities
//! - **Identifier Compression**: Generated names always fit the engine's
//!   identifier budget, reproducibly, no matter how deeply relations nest
//! - **Relation Population**: Batched loading of to-one, to-many,
//!   many-to-many and polymorphic relations, nestable per query
//! - **Lifecycle Hooks**: Before/after callbacks around every repository
//!   operation, with mutable access to the inbound payload
//!
//! ## Core Concepts
//!
//! - **Content Type**: A named shape of data, e.g. `api::restaurant.restaurant`
//! - **Attribute**: A field of a content type; scalar, relation, component or
//!   dynamic zone
//! - **Repository**: The typed handle for one content type's CRUD, linking
//!   and querying
//! - **Entity**: One decoded row, attribute-keyed, optionally carrying
//!   populated relations
//! - **Dialect**: An engine adapter owning connections, value conversion and
//!   error classification
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use corm::sqlite::SqliteDialect;
//! use corm::{
//!     AttributeSchema, ContentTypeSchema, Database, DatabaseOptions, EntityData, Filter,
//!     HookRegistry, Query, ScalarOptions, Value,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), corm::Error> {
//!     let schemas = vec![ContentTypeSchema::new("api::restaurant.restaurant", "restaurants")
//!         .attribute("name", AttributeSchema::string_with(ScalarOptions::required()))
//!         .attribute("rank", AttributeSchema::integer())];
//!
//!     let dialect = Arc::new(SqliteDialect::open_in_memory().await?);
//!     let db = Database::connect(
//!         dialect,
//!         &schemas,
//!         DatabaseOptions::new(),
//!         HookRegistry::new(),
//!     )
//!     .await?;
//!
//!     let restaurants = db.query("api::restaurant.restaurant")?;
//!     let mut data = EntityData::new();
//!     data.insert("name".to_string(), Value::from("Biscotte"));
//!     data.insert("rank".to_string(), Value::from(1));
//!     let created = restaurants.create(data).await?;
//!
//!     let found = restaurants
//!         .find(&Query::new().filter(Filter::eq("name", "Biscotte")))
//!         .await?;
//!     assert_eq!(found[0].id, created.id);
//!     Ok(())
//! }
//! ```

pub use corm_core as core;
pub use cormql;

#[cfg(feature = "postgres")]
pub use corm_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use corm_sqlite as sqlite;

// Re-export commonly used types
pub use corm_core::{
    ConfigurationError, Database, DatabaseError, DatabaseInfo, DatabaseOptions, Dialect, Entity,
    EntityData, Error, Hook, HookEvent, HookOperation, HookPhase, HookRegistry, Paramstyle,
    Population, Repository, Row, Statement, ValidationError,
};
pub use corm_core::schema::{
    AttributeSchema, ContentTypeKind, ContentTypeSchema, RelationKind, ScalarOptions,
};
pub use cormql::{Filter, Operator, Query, SortDirection, SortItem, Value};
