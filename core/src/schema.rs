//! Declarative content-type schemas, the input to metadata compilation.
//!
//! Schemas arrive as data (typically deserialized from JSON) and say nothing
//! about physical names; those are derived during compilation. Attribute maps
//! are `BTreeMap` so compilation walks them in a stable order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentTypeKind {
    CollectionType,
    Component,
}

impl Default for ContentTypeKind {
    fn default() -> Self { ContentTypeKind::CollectionType }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeSchema {
    /// Stable logical identifier, e.g. `api::restaurant.restaurant`.
    pub uid: String,
    /// Plural human name the table name derives from.
    pub collection_name: String,
    #[serde(default)]
    pub kind: ContentTypeKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
}

impl ContentTypeSchema {
    pub fn new(uid: impl Into<String>, collection_name: impl Into<String>) -> Self {
        ContentTypeSchema {
            uid: uid.into(),
            collection_name: collection_name.into(),
            kind: ContentTypeKind::CollectionType,
            attributes: BTreeMap::new(),
        }
    }

    pub fn component(uid: impl Into<String>, collection_name: impl Into<String>) -> Self {
        ContentTypeSchema { kind: ContentTypeKind::Component, ..Self::new(uid, collection_name) }
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }
}

/// Options shared by every scalar attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarOptions {
    /// Explicit physical column name, overriding the derived one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
}

impl ScalarOptions {
    pub fn required() -> Self { ScalarOptions { required: true, ..Default::default() } }

    pub fn unique() -> Self { ScalarOptions { unique: true, ..Default::default() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeSchema {
    String {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Text {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Integer {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    BigInteger {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Float {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Decimal {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Boolean {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Date {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    DateTime {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Json {
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Enumeration {
        values: Vec<String>,
        #[serde(flatten)]
        options: ScalarOptions,
    },
    Relation {
        relation: RelationKind,
        /// Target content-type uid. Absent for `morphToOne`/`morphToMany`,
        /// whose targets vary per row.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        /// Set on the owning side of a bidirectional relation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inversed_by: Option<String>,
        /// Set on the inverse side; names the owning attribute on the target.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mapped_by: Option<String>,
        /// For `morphOne`/`morphMany`: the morph attribute on the target that
        /// owns the polymorphic join table.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        morph_by: Option<String>,
    },
    Component {
        component: String,
        #[serde(default)]
        repeatable: bool,
    },
    DynamicZone {
        components: Vec<String>,
    },
}

impl AttributeSchema {
    pub fn string() -> Self { AttributeSchema::String { options: ScalarOptions::default() } }
    pub fn text() -> Self { AttributeSchema::Text { options: ScalarOptions::default() } }
    pub fn integer() -> Self { AttributeSchema::Integer { options: ScalarOptions::default() } }
    pub fn boolean() -> Self { AttributeSchema::Boolean { options: ScalarOptions::default() } }
    pub fn datetime() -> Self { AttributeSchema::DateTime { options: ScalarOptions::default() } }
    pub fn json() -> Self { AttributeSchema::Json { options: ScalarOptions::default() } }

    pub fn string_with(options: ScalarOptions) -> Self { AttributeSchema::String { options } }

    pub fn relation(kind: RelationKind, target: impl Into<String>) -> Self {
        AttributeSchema::Relation {
            relation: kind,
            target: Some(target.into()),
            inversed_by: None,
            mapped_by: None,
            morph_by: None,
        }
    }

    pub fn scalar_options(&self) -> Option<&ScalarOptions> {
        match self {
            AttributeSchema::String { options }
            | AttributeSchema::Text { options }
            | AttributeSchema::Integer { options }
            | AttributeSchema::BigInteger { options }
            | AttributeSchema::Float { options }
            | AttributeSchema::Decimal { options }
            | AttributeSchema::Boolean { options }
            | AttributeSchema::Date { options }
            | AttributeSchema::DateTime { options }
            | AttributeSchema::Json { options }
            | AttributeSchema::Enumeration { options, .. } => Some(options),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool { self.scalar_options().is_some() }
}
