//! PostgreSQL dialect for corm.
//!
//! Talks to a server over `tokio-postgres` with `bb8-postgres` pooling.
//! Capabilities reported to the core crate: `$n` placeholders, native
//! `INSERT ... RETURNING`, and the 63 byte identifier limit of a stock
//! server build.
//!
//! ```rust,ignore
//! let config = PostgresConfig {
//!     host: "localhost".to_string(),
//!     dbname: "corm".to_string(),
//!     user: "corm".to_string(),
//!     password: "corm".to_string(),
//!     ..Default::default()
//! };
//! let dialect = PostgresDialect::connect(config).await?;
//! ```

mod connection;
mod dialect;
mod error;
mod value;

pub use connection::{PostgresConfig, DEFAULT_POOL_SIZE};
pub use dialect::PostgresDialect;
pub use error::PostgresError;
