//! Query validation against compiled metadata, ahead of any SQL.
//!
//! Everything here is a caller mistake, reported as [`ValidationError`]
//! before a connection is touched: unknown fields, operators that make no
//! sense for a column's type, malformed operands, pagination smuggled into a
//! populate. The SQL builders downstream assume a validated query.

use cormql::{Filter, Operator, Query, Value};

use crate::error::ValidationError;
use crate::metadata::{ColumnClass, ContentTypeMetadata, MetadataRegistry, RelationJoin};

pub(crate) fn validate_query(
    registry: &MetadataRegistry,
    metadata: &ContentTypeMetadata,
    query: &Query,
) -> Result<(), ValidationError> {
    if let Some(filter) = &query.filter {
        validate_filter(metadata, filter)?;
    }
    for item in &query.order_by {
        validate_order_field(metadata, &item.field)?;
    }

    for (field, nested) in &query.populate {
        let Some(relation) = metadata.relation(field) else {
            return Err(if metadata.column(field).is_some() {
                ValidationError::NotARelation {
                    uid: metadata.uid.clone(),
                    field: field.clone(),
                }
            } else {
                ValidationError::UnknownField { uid: metadata.uid.clone(), field: field.clone() }
            });
        };
        if nested.limit.is_some() || nested.offset.is_some() {
            return Err(ValidationError::PopulatePagination { field: field.clone() });
        }

        match &relation.join {
            // Rows of a polymorphic table land in different target tables,
            // so there is no single type to validate a nested query against.
            RelationJoin::MorphJoinTable(_) => {
                if *nested != Query::default() {
                    return Err(ValidationError::MalformedFilter {
                        reason: format!(
                            "populate of {field} targets several types; nested queries are not supported"
                        ),
                    });
                }
            }
            _ => {
                let target_uid = relation.target_uid.as_deref().ok_or_else(|| {
                    ValidationError::MissingTarget {
                        uid: metadata.uid.clone(),
                        field: field.clone(),
                    }
                })?;
                let target = registry.get(target_uid)?;
                validate_query(registry, target, nested)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_filter(
    metadata: &ContentTypeMetadata,
    filter: &Filter,
) -> Result<(), ValidationError> {
    match filter {
        Filter::And(filters) | Filter::Or(filters) => {
            if filters.is_empty() {
                return Err(ValidationError::MalformedFilter {
                    reason: "empty $and / $or combinator".to_string(),
                });
            }
            for filter in filters {
                validate_filter(metadata, filter)?;
            }
            Ok(())
        }
        Filter::Condition { field, operator, value } => {
            validate_condition(metadata, field, *operator, value)
        }
    }
}

fn validate_order_field(
    metadata: &ContentTypeMetadata,
    field: &str,
) -> Result<(), ValidationError> {
    if metadata.column(field).is_some() {
        return Ok(());
    }
    Err(if metadata.relation(field).is_some() {
        ValidationError::MalformedFilter { reason: format!("cannot order by relation {field}") }
    } else {
        ValidationError::UnknownField { uid: metadata.uid.clone(), field: field.to_string() }
    })
}

fn validate_condition(
    metadata: &ContentTypeMetadata,
    field: &str,
    operator: Operator,
    value: &Value,
) -> Result<(), ValidationError> {
    let Some(column) = metadata.column(field) else {
        return Err(if metadata.relation(field).is_some() {
            ValidationError::MalformedFilter {
                reason: format!("{field} is a relation; filters apply to scalar attributes"),
            }
        } else {
            ValidationError::UnknownField { uid: metadata.uid.clone(), field: field.to_string() }
        });
    };

    let supported = match column.column_type.class() {
        ColumnClass::Json => {
            matches!(operator, Operator::Eq | Operator::Null | Operator::NotNull)
        }
        ColumnClass::Boolean => matches!(
            operator,
            Operator::Eq | Operator::Ne | Operator::Null | Operator::NotNull
        ),
        ColumnClass::TextLike => true,
        ColumnClass::Numeric | ColumnClass::Temporal => {
            !matches!(operator, Operator::Contains | Operator::NotContains)
        }
    };
    if !supported {
        return Err(ValidationError::OperatorNotSupported {
            field: field.to_string(),
            operator,
            column_type: column.column_type.name(),
        });
    }

    match operator {
        Operator::Eq | Operator::Ne if value.is_null() => {
            Err(ValidationError::MalformedFilter {
                reason: format!("{field}: use $null / $notNull for null checks"),
            })
        }
        Operator::In | Operator::NotIn => match value {
            Value::List(items) if items.is_empty() => Err(ValidationError::MalformedFilter {
                reason: format!("{operator} on {field} needs a non-empty list"),
            }),
            Value::List(items) if items.iter().any(|item| matches!(item, Value::List(_))) => {
                Err(ValidationError::MalformedFilter {
                    reason: format!("{operator} on {field} cannot nest lists"),
                })
            }
            Value::List(_) => Ok(()),
            _ => Err(ValidationError::MalformedFilter {
                reason: format!("{operator} on {field} expects a list"),
            }),
        },
        Operator::Between => match value {
            Value::List(items)
                if items.len() == 2
                    && !items.iter().any(|item| matches!(item, Value::List(_))) =>
            {
                Ok(())
            }
            _ => Err(ValidationError::MalformedFilter {
                reason: format!("$between on {field} expects exactly two bounds"),
            }),
        },
        Operator::Contains | Operator::NotContains => match value {
            Value::Text(_) => Ok(()),
            _ => Err(ValidationError::MalformedFilter {
                reason: format!("{operator} on {field} expects text"),
            }),
        },
        _ if matches!(value, Value::List(_)) => Err(ValidationError::MalformedFilter {
            reason: format!("{operator} on {field} expects a single value"),
        }),
        _ => Ok(()),
    }
}
