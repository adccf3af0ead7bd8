//! Embedded SQLite dialect for corm.
//!
//! Runs entirely in-process via `rusqlite` with the bundled SQLite build,
//! so no external server is needed. Connections are pooled with `bb8`; since
//! a SQLite connection is not `Send`, every call crosses into
//! `spawn_blocking` through the [`SqliteConnectionManager`].
//!
//! Capabilities reported to the query layer: `?` placeholders, no
//! `RETURNING` (new row ids come from `last_insert_rowid()` on the same
//! connection), and a conservative 30 character identifier budget so
//! generated names stay portable to stricter engines.
//!
//! # Example
//!
//! ```rust,ignore
//! use corm_sqlite::SqliteDialect;
//!
//! // File-backed database
//! let dialect = SqliteDialect::open("myapp.db").await?;
//!
//! // Or in-memory, for tests
//! let dialect = SqliteDialect::open_in_memory().await?;
//! ```

mod connection;
mod dialect;
mod error;
mod value;

pub use connection::{SqliteConfig, SqliteConnectionManager, DEFAULT_POOL_SIZE};
pub use dialect::SqliteDialect;
pub use error::SqliteError;
