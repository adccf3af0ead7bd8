use thiserror::Error;

/// Failures turning a JSON document into a [`Filter`](crate::Filter).
///
/// These cover shape only; whether a field exists or an operator suits its
/// column is checked later, against schema metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("filter must be a json object, got {got}")]
    NotAnObject { got: &'static str },
    #[error("filter object is empty")]
    Empty,
    #[error("unknown filter operator {name}")]
    UnknownOperator { name: String },
    #[error("{combinator} expects a list of filters")]
    CombinatorExpectsList { combinator: &'static str },
}
