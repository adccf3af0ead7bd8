use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FilterParseError;

/// Engine-agnostic binding value.
///
/// Everything a filter condition can compare against, and everything a row
/// can hand back, is one of these. Dialect crates map them to and from their
/// driver types.
///
/// Serialized untagged, so JSON input reads naturally: strings decode as
/// `Text` (temporal values travel as ISO text), arrays as `List`, objects as
/// `Json`. `Date`, `DateTime` and `Bytes` are produced on the Rust side and
/// by row decoding, never by JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Operand of `$in` / `$notIn` / `$between`.
    List(Vec<Value>),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Integer view of the value, if it is one. Used for id columns.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts parsed JSON into the value space used by filters: integral
    /// numbers become `Integer`, arrays become `List`, objects stay `Json`.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            object => Value::Json(object.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Bool(v) }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::Integer(v as i64) }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self { Value::Integer(v) }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Float(v) }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Text(v.to_string()) }
}
impl From<String> for Value {
    fn from(v: String) -> Self { Value::Text(v) }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Value::Bytes(v) }
}
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self { Value::Json(v) }
}
impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self { Value::Date(v) }
}
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self { Value::DateTime(v) }
}
impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Value::List(v) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Filter operators. Serialized under their `$`-names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$notIn")]
    NotIn,
    #[serde(rename = "$contains")]
    Contains,
    #[serde(rename = "$notContains")]
    NotContains,
    #[serde(rename = "$null")]
    Null,
    #[serde(rename = "$notNull")]
    NotNull,
    #[serde(rename = "$between")]
    Between,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Operator> {
        Some(match name {
            "$eq" => Operator::Eq,
            "$ne" => Operator::Ne,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$in" => Operator::In,
            "$notIn" => Operator::NotIn,
            "$contains" => Operator::Contains,
            "$notContains" => Operator::NotContains,
            "$null" => Operator::Null,
            "$notNull" => Operator::NotNull,
            "$between" => Operator::Between,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::In => "$in",
            Operator::NotIn => "$notIn",
            Operator::Contains => "$contains",
            Operator::NotContains => "$notContains",
            Operator::Null => "$null",
            Operator::NotNull => "$notNull",
            Operator::Between => "$between",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Nested boolean filter tree.
///
/// Serializes to the conventional shape: conditions as
/// `{"field": {"$op": value}}`, combinators as `{"$and": [...]}` /
/// `{"$or": [...]}`. A bare `{"field": value}` parses as `$eq`, and an object
/// with several keys parses as an implicit `$and`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Condition { field: String, operator: Operator, value: Value },
}

impl Filter {
    pub fn condition(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Filter::Condition { field: field.into(), operator, value: value.into() }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Eq, value) }
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Ne, value) }
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Lt, value) }
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Lte, value) }
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Gt, value) }
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self { Self::condition(field, Operator::Gte, value) }
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, Operator::Contains, value)
    }
    pub fn not_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, Operator::NotContains, value)
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::condition(field, Operator::In, Value::List(values))
    }
    pub fn not_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::condition(field, Operator::NotIn, Value::List(values))
    }
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::condition(field, Operator::Between, Value::List(vec![low.into(), high.into()]))
    }

    pub fn null(field: impl Into<String>) -> Self { Self::condition(field, Operator::Null, Value::Null) }
    pub fn not_null(field: impl Into<String>) -> Self { Self::condition(field, Operator::NotNull, Value::Null) }

    pub fn and(filters: Vec<Filter>) -> Self { Filter::And(filters) }
    pub fn or(filters: Vec<Filter>) -> Self { Filter::Or(filters) }

    /// Parses the conventional JSON filter shape.
    pub fn from_json(value: &serde_json::Value) -> Result<Filter, FilterParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| FilterParseError::NotAnObject { got: type_of(value) })?;
        if object.is_empty() {
            return Err(FilterParseError::Empty);
        }

        let mut items = Vec::with_capacity(object.len());
        for (key, body) in object {
            match key.as_str() {
                "$and" => items.push(Filter::And(Self::combinator_list("$and", body)?)),
                "$or" => items.push(Filter::Or(Self::combinator_list("$or", body)?)),
                name if name.starts_with('$') => {
                    return Err(FilterParseError::UnknownOperator { name: name.to_string() })
                }
                field => items.append(&mut Self::field_conditions(field, body)?),
            }
        }
        Ok(if items.len() == 1 { items.remove(0) } else { Filter::And(items) })
    }

    fn combinator_list(
        combinator: &'static str,
        value: &serde_json::Value,
    ) -> Result<Vec<Filter>, FilterParseError> {
        let list = value
            .as_array()
            .ok_or(FilterParseError::CombinatorExpectsList { combinator })?;
        list.iter().map(Self::from_json).collect()
    }

    fn field_conditions(
        field: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<Filter>, FilterParseError> {
        match body.as_object() {
            // {"rank": {"$gte": 2, "$lt": 10}}
            Some(operators) if !operators.is_empty() && operators.keys().all(|k| k.starts_with('$')) => {
                operators
                    .iter()
                    .map(|(name, operand)| {
                        let operator = Operator::parse(name).ok_or_else(|| {
                            FilterParseError::UnknownOperator { name: name.clone() }
                        })?;
                        Ok(Filter::Condition {
                            field: field.to_string(),
                            operator,
                            value: Value::from_json(operand),
                        })
                    })
                    .collect()
            }
            // {"name": "Biscotte"} is shorthand for $eq.
            _ => Ok(vec![Filter::Condition {
                field: field.to_string(),
                operator: Operator::Eq,
                value: Value::from_json(body),
            }]),
        }
    }
}

fn type_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Serialize for Filter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Filter::And(filters) => map.serialize_entry("$and", filters)?,
            Filter::Or(filters) => map.serialize_entry("$or", filters)?,
            Filter::Condition { field, operator, value } => {
                map.serialize_entry(field, &ConditionBody { operator: *operator, value })?
            }
        }
        map.end()
    }
}

struct ConditionBody<'a> {
    operator: Operator,
    value: &'a Value,
}

impl Serialize for ConditionBody<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.operator.as_str(), self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Filter::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub field: String,
    pub direction: SortDirection,
}

impl SortItem {
    pub fn asc(field: impl Into<String>) -> Self { SortItem { field: field.into(), direction: SortDirection::Asc } }
    pub fn desc(field: impl Into<String>) -> Self { SortItem { field: field.into(), direction: SortDirection::Desc } }
}

/// A query against one content type: filter, sort, pagination, and a map of
/// relation attribute name to the nested query used to populate it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SortItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub populate: BTreeMap<String, Query>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, item: SortItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn populate(mut self, attribute: impl Into<String>, nested: Query) -> Self {
        self.populate.insert(attribute.into(), nested);
        self
    }
}
