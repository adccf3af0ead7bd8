//! Schema-to-table compilation.
//!
//! [`compile`] turns declarative [`ContentTypeSchema`]s into the immutable
//! [`MetadataRegistry`]: physical table and column names (all through the
//! identifier compressor, all within the dialect budget), join tables for
//! many-to-many relations, components and dynamic zones, plus the indexes and
//! foreign keys the DDL bootstrap emits. Anything that would surface later as
//! a SQL error from bad naming is rejected here instead.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DatabaseOptions;
use crate::error::{Error, ValidationError};
use crate::ident::{compress, hash_fragment, sanitize, NameToken};
use crate::metadata::{
    AttributeMetadata, ColumnMetadata, ColumnType, ContentTypeMetadata, ForeignKeyMetadata, IndexMetadata,
    JoinTableMetadata, MetadataRegistry, MorphJoinTableMetadata, OnDelete, RelationClass, RelationJoin,
    RelationMetadata,
};
use crate::schema::{AttributeSchema, ContentTypeKind, ContentTypeSchema, RelationKind};

/// Words that cannot be used bare as column names on either engine. A column
/// that snake-cases to one of these gets a deterministic hash suffix.
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "constraint", "create", "default",
    "delete", "desc", "distinct", "drop", "else", "end", "exists", "foreign", "from", "group", "having", "in",
    "index", "inner", "insert", "into", "is", "join", "key", "left", "like", "limit", "not", "null", "offset",
    "on", "or", "order", "outer", "primary", "references", "right", "select", "set", "table", "then", "to",
    "union", "unique", "update", "user", "values", "where",
];

fn column_base(attribute_name: &str) -> String {
    let base = sanitize(attribute_name);
    if RESERVED_WORDS.contains(&base.as_str()) {
        format!("{}_{}", base, hash_fragment(&base, 4))
    } else {
        base
    }
}

fn link_suffix() -> NameToken { NameToken::fixed_short("links", "lnk") }
fn component_suffix() -> NameToken { NameToken::fixed_short("components", "cmp") }
fn zone_suffix() -> NameToken { NameToken::fixed_short("zones", "dz") }
fn morph_suffix() -> NameToken { NameToken::fixed_short("morphs", "mph") }

/// Inverse sides that can only be resolved once every owning side is built.
enum Deferred {
    /// `oneToMany` and the inverse side of `oneToOne`: resolved through the
    /// partner's FK column on the target table.
    TargetColumn { uid: String, attribute: String, target: String, mapped_by: String, class: RelationClass, many: bool },
    /// Inverse side of `manyToMany`: the owner's join table with the two
    /// sides swapped.
    InverseJoin { uid: String, attribute: String, target: String, mapped_by: String },
    /// `morphOne`/`morphMany`: resolved through the morph join table owned by
    /// an attribute on the target.
    MorphInverse { uid: String, attribute: String, target: String, morph_by: String, class: RelationClass, many: bool },
}

struct Compiler<'a> {
    options: &'a DatabaseOptions,
    max_length: usize,
    /// uid -> compiled table name, for every schema, built up front.
    table_names: BTreeMap<String, String>,
    /// uid -> declared kind, for component target checks.
    kinds: BTreeMap<String, ContentTypeKind>,
    /// physical table name -> owner description, across entity AND join tables.
    claimed_tables: BTreeMap<String, String>,
    deferred: Vec<Deferred>,
}

/// Compiles `schemas` into a registry of physical metadata.
///
/// Deterministic: the same schemas, options and budget produce identical
/// metadata regardless of input order.
pub fn compile(
    schemas: &[ContentTypeSchema],
    options: &DatabaseOptions,
    max_identifier_length: usize,
) -> Result<MetadataRegistry, Error> {
    let mut ordered: Vec<&ContentTypeSchema> = schemas.iter().collect();
    ordered.sort_by(|a, b| a.uid.cmp(&b.uid));
    for pair in ordered.windows(2) {
        if pair[0].uid == pair[1].uid {
            return Err(ValidationError::DuplicateContentType { uid: pair[0].uid.clone() }.into());
        }
    }

    let mut compiler = Compiler {
        options,
        max_length: max_identifier_length,
        table_names: BTreeMap::new(),
        kinds: BTreeMap::new(),
        claimed_tables: BTreeMap::new(),
        deferred: Vec::new(),
    };

    for schema in &ordered {
        let table = compiler.table_name(&schema.collection_name)?;
        compiler.claim_table(&table, &schema.uid)?;
        compiler.table_names.insert(schema.uid.clone(), table);
        compiler.kinds.insert(schema.uid.clone(), schema.kind);
    }

    let mut compiled: BTreeMap<String, ContentTypeMetadata> = BTreeMap::new();
    for schema in &ordered {
        let metadata = compiler.compile_type(schema)?;
        debug!(uid = %schema.uid, table = %metadata.table_name, "compiled content type");
        compiled.insert(schema.uid.clone(), metadata);
    }

    // Inverse sides read their partner's compiled attribute, so resolve them
    // in a read-only pass and apply the results afterwards.
    let mut resolved: Vec<(String, String, AttributeMetadata)> = Vec::new();
    for deferred in &compiler.deferred {
        resolved.push(compiler.resolve_deferred(deferred, &compiled)?);
    }
    for (uid, attribute, metadata) in resolved {
        if let Some(content_type) = compiled.get_mut(&uid) {
            content_type.attributes.insert(attribute, metadata);
        }
    }

    let mut registry = MetadataRegistry::default();
    for (_, metadata) in compiled {
        registry.insert(metadata);
    }
    Ok(registry)
}

impl Compiler<'_> {
    fn prefix_token(&self) -> Option<NameToken> {
        self.options.table_prefix.as_ref().map(|p| NameToken::fixed(p.clone()))
    }

    fn table_name(&self, collection_name: &str) -> Result<String, Error> {
        let mut tokens = Vec::new();
        if let Some(prefix) = self.prefix_token() {
            tokens.push(prefix);
        }
        tokens.push(NameToken::new(collection_name));
        Ok(compress(&tokens, self.max_length)?)
    }

    fn join_table_name(&self, collection_name: &str, attribute: &str, suffix: NameToken) -> Result<String, Error> {
        let mut tokens = Vec::new();
        if let Some(prefix) = self.prefix_token() {
            tokens.push(prefix);
        }
        tokens.push(NameToken::new(collection_name));
        tokens.push(NameToken::new(attribute));
        tokens.push(suffix);
        Ok(compress(&tokens, self.max_length)?)
    }

    /// `{collection}_{attribute}_{role}`, compressed.
    fn role_column(&self, collection_name: &str, attribute: &str, role: &str) -> Result<String, Error> {
        let tokens =
            vec![NameToken::new(collection_name), NameToken::new(attribute), NameToken::fixed(role)];
        Ok(compress(&tokens, self.max_length)?)
    }

    fn object_name(&self, table: &str, column: &str, suffix: &str) -> Result<String, Error> {
        let tokens = vec![NameToken::new(table), NameToken::new(column), NameToken::fixed(suffix)];
        Ok(compress(&tokens, self.max_length)?)
    }

    fn claim_table(&mut self, table: &str, owner: &str) -> Result<(), Error> {
        if let Some(first) = self.claimed_tables.insert(table.to_string(), owner.to_string()) {
            return Err(ValidationError::DuplicateTableName {
                table: table.to_string(),
                first,
                second: owner.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn target_table(&self, uid: &str, field: &str, target: &str) -> Result<String, Error> {
        match self.table_names.get(target) {
            Some(table) => Ok(table.clone()),
            None => Err(ValidationError::UnknownTarget {
                uid: uid.to_string(),
                field: field.to_string(),
                target: target.to_string(),
            }
            .into()),
        }
    }

    fn compile_type(&mut self, schema: &ContentTypeSchema) -> Result<ContentTypeMetadata, Error> {
        let table_name = self.table_names[&schema.uid].clone();
        let mut attributes: BTreeMap<String, AttributeMetadata> = BTreeMap::new();
        let mut indexes: Vec<IndexMetadata> = Vec::new();
        let mut foreign_keys: Vec<ForeignKeyMetadata> = Vec::new();
        let mut claimed_columns: BTreeMap<String, String> = BTreeMap::new();
        claimed_columns.insert("id".to_string(), "id".to_string());

        let mut claim_column = |column: &str, attribute: &str| -> Result<(), Error> {
            if let Some(first) = claimed_columns.insert(column.to_string(), attribute.to_string()) {
                return Err(ValidationError::ColumnCollision {
                    uid: schema.uid.clone(),
                    first,
                    second: attribute.to_string(),
                    column: column.to_string(),
                }
                .into());
            }
            Ok(())
        };

        for (name, attribute) in &schema.attributes {
            match attribute {
                scalar if scalar.is_scalar() => {
                    let options = scalar.scalar_options().cloned().unwrap_or_default();
                    let column_name = match &options.column_name {
                        Some(explicit) => compress(&[NameToken::new(explicit.clone())], self.max_length)?,
                        None => compress(&[NameToken::new(column_base(name))], self.max_length)?,
                    };
                    claim_column(&column_name, name)?;

                    if options.unique {
                        indexes.push(IndexMetadata {
                            name: self.object_name(&table_name, &column_name, "uq")?,
                            columns: vec![column_name.clone()],
                            unique: true,
                        });
                    }
                    attributes.insert(
                        name.clone(),
                        AttributeMetadata::Column(ColumnMetadata {
                            column_name,
                            column_type: scalar_column_type(scalar),
                            unique: options.unique,
                            nullable: !options.required,
                        }),
                    );
                }

                AttributeSchema::Relation { relation, target, inversed_by: _, mapped_by, morph_by } => {
                    self.compile_relation(
                        schema,
                        name,
                        *relation,
                        target.as_deref(),
                        mapped_by.as_deref(),
                        morph_by.as_deref(),
                        &table_name,
                        &mut attributes,
                        &mut indexes,
                        &mut foreign_keys,
                        &mut claim_column,
                    )?;
                }

                AttributeSchema::Component { component, repeatable } => {
                    if self.kinds.get(component) != Some(&ContentTypeKind::Component) {
                        if !self.table_names.contains_key(component) {
                            return Err(ValidationError::UnknownTarget {
                                uid: schema.uid.clone(),
                                field: name.clone(),
                                target: component.clone(),
                            }
                            .into());
                        }
                        return Err(ValidationError::TargetNotComponent {
                            uid: schema.uid.clone(),
                            field: name.clone(),
                            target: component.clone(),
                        }
                        .into());
                    }

                    let join = self.build_join_table(
                        schema,
                        name,
                        component,
                        component_suffix(),
                        true,
                    )?;
                    attributes.insert(
                        name.clone(),
                        AttributeMetadata::Relation(RelationMetadata {
                            class: RelationClass::Component,
                            many: *repeatable,
                            target_uid: Some(component.clone()),
                            targets: Vec::new(),
                            join: RelationJoin::JoinTable(join),
                        }),
                    );
                }

                AttributeSchema::DynamicZone { components } => {
                    for component in components {
                        if self.kinds.get(component) != Some(&ContentTypeKind::Component) {
                            if !self.table_names.contains_key(component) {
                                return Err(ValidationError::UnknownTarget {
                                    uid: schema.uid.clone(),
                                    field: name.clone(),
                                    target: component.clone(),
                                }
                                .into());
                            }
                            return Err(ValidationError::TargetNotComponent {
                                uid: schema.uid.clone(),
                                field: name.clone(),
                                target: component.clone(),
                            }
                            .into());
                        }
                    }

                    let join = self.build_morph_join_table(schema, name, zone_suffix(), true)?;
                    attributes.insert(
                        name.clone(),
                        AttributeMetadata::Relation(RelationMetadata {
                            class: RelationClass::DynamicZone,
                            many: true,
                            target_uid: None,
                            targets: components.clone(),
                            join: RelationJoin::MorphJoinTable(join),
                        }),
                    );
                }

                _ => {}
            }
        }

        Ok(ContentTypeMetadata {
            uid: schema.uid.clone(),
            table_name,
            kind: schema.kind,
            attributes,
            indexes,
            foreign_keys,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_relation(
        &mut self,
        schema: &ContentTypeSchema,
        name: &str,
        kind: RelationKind,
        target: Option<&str>,
        mapped_by: Option<&str>,
        morph_by: Option<&str>,
        table_name: &str,
        attributes: &mut BTreeMap<String, AttributeMetadata>,
        indexes: &mut Vec<IndexMetadata>,
        foreign_keys: &mut Vec<ForeignKeyMetadata>,
        claim_column: &mut impl FnMut(&str, &str) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let require_target = || -> Result<&str, Error> {
            target.ok_or_else(|| {
                ValidationError::MissingTarget { uid: schema.uid.clone(), field: name.to_string() }.into()
            })
        };

        match kind {
            RelationKind::OneToOne | RelationKind::ManyToOne => {
                // Only oneToOne has an inverse side; manyToOne always owns
                // its FK column.
                if kind == RelationKind::OneToOne {
                    if let Some(mapped_by) = mapped_by {
                        let target = require_target()?;
                        self.target_table(&schema.uid, name, target)?;
                        self.deferred.push(Deferred::TargetColumn {
                            uid: schema.uid.clone(),
                            attribute: name.to_string(),
                            target: target.to_string(),
                            mapped_by: mapped_by.to_string(),
                            class: RelationClass::OneToOne,
                            many: false,
                        });
                        return Ok(());
                    }
                }

                let target = require_target()?;
                let target_table = self.target_table(&schema.uid, name, target)?;
                let column =
                    compress(&[NameToken::new(sanitize(name)), NameToken::fixed("id")], self.max_length)?;
                claim_column(&column, name)?;

                indexes.push(IndexMetadata {
                    name: self.object_name(table_name, &column, if kind == RelationKind::OneToOne { "uq" } else { "idx" })?,
                    columns: vec![column.clone()],
                    unique: kind == RelationKind::OneToOne,
                });
                foreign_keys.push(ForeignKeyMetadata {
                    name: self.object_name(table_name, &column, "fk")?,
                    column: column.clone(),
                    references_table: target_table,
                    on_delete: OnDelete::SetNull,
                });
                attributes.insert(
                    name.to_string(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: relation_class(kind),
                        many: false,
                        target_uid: Some(target.to_string()),
                        targets: Vec::new(),
                        join: RelationJoin::SourceColumn { column },
                    }),
                );
            }

            RelationKind::OneToMany => {
                let target = require_target()?;
                self.target_table(&schema.uid, name, target)?;
                let Some(mapped_by) = mapped_by else {
                    return Err(ValidationError::MissingInverse {
                        uid: schema.uid.clone(),
                        field: name.to_string(),
                        setting: "mapped_by",
                    }
                    .into());
                };
                self.deferred.push(Deferred::TargetColumn {
                    uid: schema.uid.clone(),
                    attribute: name.to_string(),
                    target: target.to_string(),
                    mapped_by: mapped_by.to_string(),
                    class: RelationClass::OneToMany,
                    many: true,
                });
            }

            RelationKind::ManyToMany => {
                let target = require_target()?;
                self.target_table(&schema.uid, name, target)?;
                if let Some(mapped_by) = mapped_by {
                    self.deferred.push(Deferred::InverseJoin {
                        uid: schema.uid.clone(),
                        attribute: name.to_string(),
                        target: target.to_string(),
                        mapped_by: mapped_by.to_string(),
                    });
                    return Ok(());
                }

                let join = self.build_join_table(schema, name, target, link_suffix(), false)?;
                attributes.insert(
                    name.to_string(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: RelationClass::ManyToMany,
                        many: true,
                        target_uid: Some(target.to_string()),
                        targets: Vec::new(),
                        join: RelationJoin::JoinTable(join),
                    }),
                );
            }

            RelationKind::MorphOne | RelationKind::MorphMany => {
                let target = require_target()?;
                self.target_table(&schema.uid, name, target)?;
                let Some(morph_by) = morph_by else {
                    return Err(ValidationError::MissingInverse {
                        uid: schema.uid.clone(),
                        field: name.to_string(),
                        setting: "morph_by",
                    }
                    .into());
                };
                self.deferred.push(Deferred::MorphInverse {
                    uid: schema.uid.clone(),
                    attribute: name.to_string(),
                    target: target.to_string(),
                    morph_by: morph_by.to_string(),
                    class: relation_class(kind),
                    many: kind == RelationKind::MorphMany,
                });
            }

            RelationKind::MorphToOne | RelationKind::MorphToMany => {
                let join = self.build_morph_join_table(schema, name, morph_suffix(), false)?;
                attributes.insert(
                    name.to_string(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: relation_class(kind),
                        many: kind == RelationKind::MorphToMany,
                        target_uid: None,
                        targets: Vec::new(),
                        join: RelationJoin::MorphJoinTable(join),
                    }),
                );
            }
        }
        Ok(())
    }

    fn build_join_table(
        &mut self,
        schema: &ContentTypeSchema,
        attribute: &str,
        target: &str,
        suffix: NameToken,
        with_order: bool,
    ) -> Result<JoinTableMetadata, Error> {
        let source_table = self.table_names[&schema.uid].clone();
        let target_table = self.target_table(&schema.uid, attribute, target)?;

        let table_name = self.join_table_name(&schema.collection_name, attribute, suffix)?;
        self.claim_table(&table_name, &format!("{}.{}", schema.uid, attribute))?;

        let source_column = self.role_column(&schema.collection_name, attribute, "source_id")?;
        let target_column = self.role_column(&schema.collection_name, attribute, "target_id")?;
        let order_column =
            if with_order { Some(self.role_column(&schema.collection_name, attribute, "order")?) } else { None };
        self.check_join_columns(
            &schema.uid,
            attribute,
            [Some(source_column.as_str()), Some(target_column.as_str()), order_column.as_deref()],
        )?;

        let mut indexes = vec![
            IndexMetadata {
                name: self.object_name(&table_name, &source_column, "idx")?,
                columns: vec![source_column.clone()],
                unique: false,
            },
            IndexMetadata {
                name: self.object_name(&table_name, &target_column, "idx")?,
                columns: vec![target_column.clone()],
                unique: false,
            },
        ];
        if !with_order {
            // Plain links cannot repeat; ordered component rows can only
            // repeat per instance anyway.
            indexes.push(IndexMetadata {
                name: self.object_name(&table_name, "source_target", "uq")?,
                columns: vec![source_column.clone(), target_column.clone()],
                unique: true,
            });
        }

        let foreign_keys = vec![
            ForeignKeyMetadata {
                name: self.object_name(&table_name, &source_column, "fk")?,
                column: source_column.clone(),
                references_table: source_table,
                on_delete: OnDelete::Cascade,
            },
            ForeignKeyMetadata {
                name: self.object_name(&table_name, &target_column, "fk")?,
                column: target_column.clone(),
                references_table: target_table,
                on_delete: OnDelete::Cascade,
            },
        ];

        Ok(JoinTableMetadata { table_name, source_column, target_column, order_column, indexes, foreign_keys })
    }

    fn build_morph_join_table(
        &mut self,
        schema: &ContentTypeSchema,
        attribute: &str,
        suffix: NameToken,
        with_order: bool,
    ) -> Result<MorphJoinTableMetadata, Error> {
        let source_table = self.table_names[&schema.uid].clone();

        let table_name = self.join_table_name(&schema.collection_name, attribute, suffix)?;
        self.claim_table(&table_name, &format!("{}.{}", schema.uid, attribute))?;

        let source_column = self.role_column(&schema.collection_name, attribute, "source_id")?;
        let target_id_column = self.role_column(&schema.collection_name, attribute, "target_id")?;
        let target_type_column = self.role_column(&schema.collection_name, attribute, "target_type")?;
        let order_column =
            if with_order { Some(self.role_column(&schema.collection_name, attribute, "order")?) } else { None };

        let indexes = vec![
            IndexMetadata {
                name: self.object_name(&table_name, &source_column, "idx")?,
                columns: vec![source_column.clone()],
                unique: false,
            },
            IndexMetadata {
                name: self.object_name(&table_name, &target_type_column, "idx")?,
                columns: vec![target_type_column.clone(), target_id_column.clone()],
                unique: false,
            },
        ];
        let foreign_keys = vec![ForeignKeyMetadata {
            name: self.object_name(&table_name, &source_column, "fk")?,
            column: source_column.clone(),
            references_table: source_table,
            on_delete: OnDelete::Cascade,
        }];

        Ok(MorphJoinTableMetadata {
            table_name,
            source_column,
            target_id_column,
            target_type_column,
            order_column,
            indexes,
            foreign_keys,
        })
    }

    fn check_join_columns(
        &self,
        uid: &str,
        attribute: &str,
        columns: [Option<&str>; 3],
    ) -> Result<(), Error> {
        let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
        for column in columns.into_iter().flatten() {
            if seen.insert(column, ()).is_some() {
                return Err(ValidationError::ColumnCollision {
                    uid: uid.to_string(),
                    first: attribute.to_string(),
                    second: attribute.to_string(),
                    column: column.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn resolve_deferred(
        &self,
        deferred: &Deferred,
        compiled: &BTreeMap<String, ContentTypeMetadata>,
    ) -> Result<(String, String, AttributeMetadata), Error> {
        let invalid = |uid: &str, field: &str, partner: &str, reason: &'static str| -> Error {
            ValidationError::InvalidInverse {
                uid: uid.to_string(),
                field: field.to_string(),
                partner: partner.to_string(),
                reason,
            }
            .into()
        };

        match deferred {
            Deferred::TargetColumn { uid, attribute, target, mapped_by, class, many } => {
                let partner = compiled
                    .get(target)
                    .and_then(|t| t.relation(mapped_by))
                    .ok_or_else(|| invalid(uid, attribute, mapped_by, "does not exist or is not an owning relation"))?;
                if partner.target_uid.as_deref() != Some(uid.as_str()) {
                    return Err(invalid(uid, attribute, mapped_by, "does not point back at this type"));
                }
                let RelationJoin::SourceColumn { column } = &partner.join else {
                    return Err(invalid(uid, attribute, mapped_by, "is not an owning to-one relation"));
                };
                Ok((
                    uid.clone(),
                    attribute.clone(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: *class,
                        many: *many,
                        target_uid: Some(target.clone()),
                        targets: Vec::new(),
                        join: RelationJoin::TargetColumn { column: column.clone() },
                    }),
                ))
            }

            Deferred::InverseJoin { uid, attribute, target, mapped_by } => {
                let partner = compiled
                    .get(target)
                    .and_then(|t| t.relation(mapped_by))
                    .ok_or_else(|| invalid(uid, attribute, mapped_by, "does not exist or is not an owning relation"))?;
                if partner.target_uid.as_deref() != Some(uid.as_str()) {
                    return Err(invalid(uid, attribute, mapped_by, "does not point back at this type"));
                }
                let RelationJoin::JoinTable(owner_join) = &partner.join else {
                    return Err(invalid(uid, attribute, mapped_by, "is not an owning many-to-many relation"));
                };
                let mut join = owner_join.clone();
                std::mem::swap(&mut join.source_column, &mut join.target_column);
                Ok((
                    uid.clone(),
                    attribute.clone(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: RelationClass::ManyToMany,
                        many: true,
                        target_uid: Some(target.clone()),
                        targets: Vec::new(),
                        join: RelationJoin::JoinTable(join),
                    }),
                ))
            }

            Deferred::MorphInverse { uid, attribute, target, morph_by, class, many } => {
                let partner = compiled
                    .get(target)
                    .and_then(|t| t.relation(morph_by))
                    .ok_or_else(|| invalid(uid, attribute, morph_by, "does not exist or is not a relation"))?;
                let RelationJoin::MorphJoinTable(_) = &partner.join else {
                    return Err(invalid(uid, attribute, morph_by, "is not a polymorphic relation"));
                };
                Ok((
                    uid.clone(),
                    attribute.clone(),
                    AttributeMetadata::Relation(RelationMetadata {
                        class: *class,
                        many: *many,
                        target_uid: Some(target.clone()),
                        targets: Vec::new(),
                        join: RelationJoin::MorphInverse { owner_attribute: morph_by.clone() },
                    }),
                ))
            }
        }
    }
}

fn relation_class(kind: RelationKind) -> RelationClass {
    match kind {
        RelationKind::OneToOne => RelationClass::OneToOne,
        RelationKind::OneToMany => RelationClass::OneToMany,
        RelationKind::ManyToOne => RelationClass::ManyToOne,
        RelationKind::ManyToMany => RelationClass::ManyToMany,
        RelationKind::MorphOne => RelationClass::MorphOne,
        RelationKind::MorphMany => RelationClass::MorphMany,
        RelationKind::MorphToOne => RelationClass::MorphToOne,
        RelationKind::MorphToMany => RelationClass::MorphToMany,
    }
}

fn scalar_column_type(attribute: &AttributeSchema) -> ColumnType {
    match attribute {
        AttributeSchema::String { .. } | AttributeSchema::Enumeration { .. } => ColumnType::String,
        AttributeSchema::Text { .. } => ColumnType::Text,
        AttributeSchema::Integer { .. } => ColumnType::Integer,
        AttributeSchema::BigInteger { .. } => ColumnType::BigInteger,
        AttributeSchema::Float { .. } => ColumnType::Float,
        AttributeSchema::Decimal { .. } => ColumnType::Decimal,
        AttributeSchema::Boolean { .. } => ColumnType::Boolean,
        AttributeSchema::Date { .. } => ColumnType::Date,
        AttributeSchema::DateTime { .. } => ColumnType::DateTime,
        AttributeSchema::Json { .. } => ColumnType::Json,
        _ => ColumnType::Text,
    }
}
