//! Query specification AST for corm.
//!
//! A query is a plain data structure: a filter tree of `$`-operators over
//! attribute names, sort items, pagination bounds, and a populate map for
//! relation traversal. Nothing in this crate talks to a database or knows
//! about SQL; the mapping from attribute names to columns and the rendering
//! into dialect-specific SQL happen in `corm-core`.

pub mod ast;
pub mod error;

pub use ast::{Filter, Operator, Query, SortDirection, SortItem, Value};
pub use error::FilterParseError;
