pub mod config;
pub mod db;
pub mod ddl;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod ident;
pub mod mapper;
pub mod metadata;
mod query;
pub mod repository;
pub mod schema;

pub use config::DatabaseOptions;
pub use db::Database;
pub use dialect::{DatabaseInfo, Dialect, Paramstyle, Row, Statement};
pub use entity::{Entity, EntityData, Population};
pub use error::{ConfigurationError, DatabaseError, Error, ValidationError};
pub use hooks::{Hook, HookEvent, HookOperation, HookPhase, HookRegistry};
pub use metadata::{ContentTypeMetadata, MetadataRegistry};
pub use repository::Repository;
pub use schema::{AttributeSchema, ContentTypeKind, ContentTypeSchema, RelationKind, ScalarOptions};

pub use cormql;
pub use cormql::{Filter, Operator, Query, SortDirection, SortItem, Value};
