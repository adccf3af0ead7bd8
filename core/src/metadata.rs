//! Compiled physical metadata.
//!
//! Everything here is produced once by [`crate::mapper::compile`] and shared
//! read-only afterwards. Query building, DDL bootstrap, and population all
//! consult this model; nothing ever mutates it during execution.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::schema::ContentTypeKind;

/// Physical column type, mapped to engine SQL by each dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Text,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Json,
}

/// Coarse grouping used by query validation to decide which operators apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    TextLike,
    Numeric,
    Temporal,
    Boolean,
    Json,
}

impl ColumnType {
    pub fn class(&self) -> ColumnClass {
        match self {
            ColumnType::String | ColumnType::Text => ColumnClass::TextLike,
            ColumnType::Integer | ColumnType::BigInteger | ColumnType::Float | ColumnType::Decimal => {
                ColumnClass::Numeric
            }
            ColumnType::Date | ColumnType::DateTime => ColumnClass::Temporal,
            ColumnType::Boolean => ColumnClass::Boolean,
            ColumnType::Json => ColumnClass::Json,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "biginteger",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub column_name: String,
    pub column_type: ColumnType,
    pub unique: bool,
    pub nullable: bool,
}

/// Compiled relation kind. Schema relations plus the structural kinds that
/// components and dynamic zones compile into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationClass {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
    Component,
    DynamicZone,
}

/// How a relation is resolved physically.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationJoin {
    /// Owning to-one: FK column on the source table.
    SourceColumn { column: String },
    /// Resolved through the partner's FK column on the target table.
    TargetColumn { column: String },
    /// Dedicated join table (many-to-many, components).
    JoinTable(JoinTableMetadata),
    /// Join table with a discriminator column (polymorphic, dynamic zones).
    MorphJoinTable(MorphJoinTableMetadata),
    /// Resolved through the morph join table owned by `owner_attribute` on
    /// the target, filtered to rows whose discriminator names this type.
    MorphInverse { owner_attribute: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationMetadata {
    pub class: RelationClass,
    /// Whether population yields a list or a single optional entity.
    pub many: bool,
    pub target_uid: Option<String>,
    /// Allowed target uids for dynamic zones; empty means unrestricted.
    pub targets: Vec<String>,
    pub join: RelationJoin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMetadata {
    Column(ColumnMetadata),
    Relation(RelationMetadata),
}

impl AttributeMetadata {
    pub fn as_column(&self) -> Option<&ColumnMetadata> {
        match self {
            AttributeMetadata::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationMetadata> {
        match self {
            AttributeMetadata::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyMetadata {
    pub name: String,
    pub column: String,
    pub references_table: String,
    pub on_delete: OnDelete,
}

/// A relation join table: its own surrogate `id`, two sides, and optionally
/// an ordering column for repeatable components.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTableMetadata {
    pub table_name: String,
    pub source_column: String,
    pub target_column: String,
    pub order_column: Option<String>,
    pub indexes: Vec<IndexMetadata>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
}

/// A polymorphic join table: target rows are addressed by (type, id) instead
/// of a foreign key, so only the source side gets a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphJoinTableMetadata {
    pub table_name: String,
    pub source_column: String,
    pub target_id_column: String,
    pub target_type_column: String,
    pub order_column: Option<String>,
    pub indexes: Vec<IndexMetadata>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeMetadata {
    pub uid: String,
    pub table_name: String,
    pub kind: ContentTypeKind,
    pub attributes: BTreeMap<String, AttributeMetadata>,
    pub indexes: Vec<IndexMetadata>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
}

impl ContentTypeMetadata {
    /// Column metadata for a filterable field. `id` is implicit on every
    /// table and exposed as a bigint column.
    pub fn column(&self, field: &str) -> Option<ColumnMetadata> {
        if field == "id" {
            return Some(ColumnMetadata {
                column_name: "id".to_string(),
                column_type: ColumnType::BigInteger,
                unique: true,
                nullable: false,
            });
        }
        self.attributes.get(field).and_then(AttributeMetadata::as_column).cloned()
    }

    pub fn relation(&self, field: &str) -> Option<&RelationMetadata> {
        self.attributes.get(field).and_then(AttributeMetadata::as_relation)
    }

    /// Scalar columns in attribute order, the explicit SELECT list of every
    /// query against this table.
    pub fn columns(&self) -> Vec<&ColumnMetadata> {
        self.attributes.values().filter_map(AttributeMetadata::as_column).collect()
    }

    /// Join tables owned by this type's relations. Inverse sides reference
    /// their owner's table, so callers dedupe by table name.
    pub fn join_tables(&self) -> Vec<JoinTable<'_>> {
        self.attributes
            .values()
            .filter_map(AttributeMetadata::as_relation)
            .filter_map(|relation| match &relation.join {
                RelationJoin::JoinTable(jt) => Some(JoinTable::Plain(jt)),
                RelationJoin::MorphJoinTable(mjt) => Some(JoinTable::Morph(mjt)),
                _ => None,
            })
            .collect()
    }
}

/// Either flavor of join table, for DDL iteration.
#[derive(Debug, Clone, Copy)]
pub enum JoinTable<'a> {
    Plain(&'a JoinTableMetadata),
    Morph(&'a MorphJoinTableMetadata),
}

impl JoinTable<'_> {
    pub fn table_name(&self) -> &str {
        match self {
            JoinTable::Plain(jt) => &jt.table_name,
            JoinTable::Morph(mjt) => &mjt.table_name,
        }
    }
}

/// The compiled registry: one entry per content type, keyed by uid.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    types: BTreeMap<String, Arc<ContentTypeMetadata>>,
}

impl MetadataRegistry {
    pub(crate) fn insert(&mut self, metadata: ContentTypeMetadata) {
        self.types.insert(metadata.uid.clone(), Arc::new(metadata));
    }

    pub fn get(&self, uid: &str) -> Result<&Arc<ContentTypeMetadata>, ValidationError> {
        self.types.get(uid).ok_or_else(|| ValidationError::UnknownContentType { uid: uid.to_string() })
    }

    pub fn contains(&self, uid: &str) -> bool { self.types.contains_key(uid) }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<ContentTypeMetadata>)> { self.types.iter() }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn is_empty(&self) -> bool { self.types.is_empty() }
}
