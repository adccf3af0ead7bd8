//! Deterministic identifier compression.
//!
//! Physical names are built from ordered [`NameToken`]s joined with `_`.
//! When the naive join exceeds the dialect budget, the longest compressible
//! token is shrunk by replacing its tail with a short hash of the full token,
//! repeatedly, until the name fits. The same tokens and budget always produce
//! the same name, on every machine, in every process.

use convert_case::{Case, Casing};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::ConfigurationError;

/// Length of the hash fragment spliced into a compressed token. A token is
/// never shrunk below this, so two long tokens sharing a prefix still get
/// distinct fragments.
pub const HASH_LENGTH: usize = 5;

/// One part of a physical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    name: String,
    compressible: bool,
    short_name: Option<String>,
}

impl NameToken {
    /// A compressible token; shrunk first when the budget is tight.
    pub fn new(name: impl Into<String>) -> Self {
        NameToken { name: name.into(), compressible: true, short_name: None }
    }

    /// An incompressible token, rendered in full or not at all.
    pub fn fixed(name: impl Into<String>) -> Self {
        NameToken { name: name.into(), compressible: false, short_name: None }
    }

    /// An incompressible token with a pre-chosen short rendering.
    pub fn fixed_short(name: impl Into<String>, short_name: impl Into<String>) -> Self {
        NameToken { name: name.into(), compressible: false, short_name: Some(short_name.into()) }
    }

    pub fn name(&self) -> &str { &self.name }

    fn render(&self) -> String {
        match &self.short_name {
            Some(short) => sanitize(short),
            None => sanitize(&self.name),
        }
    }
}

/// Snake-cases a name and restricts it to `[a-z0-9_]`.
pub(crate) fn sanitize(name: &str) -> String {
    name.to_case(Case::Snake).chars().filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_').collect()
}

/// Lowercase hex fragment of the xxh3 hash of `input`.
pub fn hash_fragment(input: &str, length: usize) -> String {
    let mut hex = format!("{:016x}", xxh3_64(input.as_bytes()));
    hex.truncate(length);
    hex
}

struct Part {
    base: String,
    fragment: String,
    compressible: bool,
    rendered: String,
}

impl Part {
    fn shrink_to(&mut self, length: usize) {
        let head = length.saturating_sub(HASH_LENGTH);
        self.rendered = format!("{}{}", &self.base[..head], self.fragment);
    }
}

/// Joins `tokens` into a `[a-z0-9_]` identifier of at most `max_length`
/// characters, compressing tokens as needed.
///
/// Fails with [`ConfigurationError::IdentifierBudget`] when the budget cannot
/// be met even with every compressible token at its minimum length.
pub fn compress(tokens: &[NameToken], max_length: usize) -> Result<String, ConfigurationError> {
    let mut parts: Vec<Part> = tokens
        .iter()
        .filter_map(|token| {
            let base = token.render();
            if base.is_empty() {
                return None;
            }
            let fragment = hash_fragment(&base, HASH_LENGTH);
            Some(Part { rendered: base.clone(), base, fragment, compressible: token.compressible })
        })
        .collect();

    if parts.is_empty() {
        return Ok(String::new());
    }

    let total = |parts: &[Part]| parts.iter().map(|p| p.rendered.len()).sum::<usize>() + parts.len() - 1;

    while total(&parts) > max_length {
        let over = total(&parts) - max_length;

        // Longest still-shrinkable token, earliest on ties.
        let pick = parts
            .iter()
            .enumerate()
            .filter(|(_, p)| p.compressible && p.rendered.len() > HASH_LENGTH)
            .max_by(|(ai, a), (bi, b)| a.rendered.len().cmp(&b.rendered.len()).then(bi.cmp(ai)))
            .map(|(i, _)| i);

        let Some(index) = pick else {
            let joined: Vec<String> = parts.iter().map(|p| p.base.clone()).collect();
            let required = parts
                .iter()
                .map(|p| if p.compressible { p.base.len().min(HASH_LENGTH) } else { p.base.len() })
                .sum::<usize>()
                + parts.len()
                - 1;
            return Err(ConfigurationError::IdentifierBudget { joined: joined.join("_"), max_length, required });
        };

        let current = parts[index].rendered.len();
        let target = current.saturating_sub(over).max(HASH_LENGTH);
        parts[index].shrink_to(target);
    }

    Ok(parts.iter().map(|p| p.rendered.as_str()).collect::<Vec<_>>().join("_"))
}
