//! Query building: validation, SQL rendering, and relation population.

pub(crate) mod mutate;
pub(crate) mod populate;
pub(crate) mod select;
pub(crate) mod validate;
pub(crate) mod writer;
