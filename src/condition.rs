//! Condition Accumulator
//!
//! Records filter, sort, paging and projection operators in call order. Nothing is
//! evaluated locally: the recorded sequence is replayed, unchanged and in order, to
//! the site's query route where the remote engine interprets it.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recognized query operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    HasSome,
    HasAll,
    IsEmpty,
    IsNotEmpty,
    Between,
    Ascending,
    Descending,
    Limit,
    Skip,
    Include,
    Fields,
}

/// Operator family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Filter,
    Sort,
    Paging,
    Projection,
}

const OPERATOR_TABLE: [(&str, Operator, OperatorKind); 20] = [
    ("eq", Operator::Eq, OperatorKind::Filter),
    ("ne", Operator::Ne, OperatorKind::Filter),
    ("gt", Operator::Gt, OperatorKind::Filter),
    ("gte", Operator::Gte, OperatorKind::Filter),
    ("lt", Operator::Lt, OperatorKind::Filter),
    ("lte", Operator::Lte, OperatorKind::Filter),
    ("contains", Operator::Contains, OperatorKind::Filter),
    ("startsWith", Operator::StartsWith, OperatorKind::Filter),
    ("endsWith", Operator::EndsWith, OperatorKind::Filter),
    ("hasSome", Operator::HasSome, OperatorKind::Filter),
    ("hasAll", Operator::HasAll, OperatorKind::Filter),
    ("isEmpty", Operator::IsEmpty, OperatorKind::Filter),
    ("isNotEmpty", Operator::IsNotEmpty, OperatorKind::Filter),
    ("between", Operator::Between, OperatorKind::Filter),
    ("ascending", Operator::Ascending, OperatorKind::Sort),
    ("descending", Operator::Descending, OperatorKind::Sort),
    ("limit", Operator::Limit, OperatorKind::Paging),
    ("skip", Operator::Skip, OperatorKind::Paging),
    ("include", Operator::Include, OperatorKind::Projection),
    ("fields", Operator::Fields, OperatorKind::Projection),
];

impl Operator {
    /// Resolve a wire name against the operator table.
    pub fn from_name(name: &str) -> Option<Operator> {
        OPERATOR_TABLE
            .iter()
            .find(|(entry, _, _)| *entry == name)
            .map(|(_, op, _)| *op)
    }

    pub fn as_str(self) -> &'static str {
        self.entry().0
    }

    pub fn kind(self) -> OperatorKind {
        self.entry().2
    }

    fn entry(self) -> &'static (&'static str, Operator, OperatorKind) {
        // The table holds exactly one row per variant, in declaration order.
        &OPERATOR_TABLE[self as usize]
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field reference: a single name, or an ordered list for projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Name(String),
    Names(Vec<String>),
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Name(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::Name(name)
    }
}

impl From<Vec<String>> for Field {
    fn from(names: Vec<String>) -> Self {
        Field::Names(names)
    }
}

impl From<Vec<&str>> for Field {
    fn from(names: Vec<&str>) -> Self {
        Field::Names(names.into_iter().map(str::to_string).collect())
    }
}

/// One recorded query operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: Option<Field>,
    pub operator: Operator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_value: Option<Value>,
}

impl Condition {
    /// Single-operand filter (`eq`, `contains`, `hasSome`, ...).
    pub fn filter(field: impl Into<Field>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: value.into(),
            extra_value: None,
        }
    }

    /// Range filter; `extra_value` carries the upper bound.
    pub fn between(field: impl Into<Field>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self {
            field: Some(field.into()),
            operator: Operator::Between,
            value: low.into(),
            extra_value: Some(high.into()),
        }
    }

    /// Operand-less filter (`isEmpty`, `isNotEmpty`).
    pub fn presence(field: impl Into<Field>, operator: Operator) -> Self {
        Self {
            field: Some(field.into()),
            operator,
            value: Value::Null,
            extra_value: None,
        }
    }

    pub fn sort(field: impl Into<Field>, operator: Operator) -> Self {
        Self::presence(field, operator)
    }

    pub fn projection(operator: Operator, fields: impl Into<Field>) -> Self {
        Self::presence(fields, operator)
    }

    /// `limit(n)`; n must be a positive integer.
    pub fn limit(n: i64) -> Result<Self, QueryError> {
        if n <= 0 {
            return Err(QueryError::Validation(format!(
                "limit must be a positive integer, got {}",
                n
            )));
        }
        Ok(Self::paging(Operator::Limit, n))
    }

    /// `skip(n)`; n must be a non-negative integer.
    pub fn skip(n: i64) -> Result<Self, QueryError> {
        if n < 0 {
            return Err(QueryError::Validation(format!(
                "skip must be a non-negative integer, got {}",
                n
            )));
        }
        Ok(Self::paging(Operator::Skip, n))
    }

    fn paging(operator: Operator, n: i64) -> Self {
        Self {
            field: None,
            operator,
            value: Value::from(n),
            extra_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Resolved(Condition),
    Named {
        operator: String,
        field: Option<Field>,
        value: Value,
        extra_value: Option<Value>,
    },
}

/// Ordered, append-only sequence of recorded conditions.
///
/// Entries recorded by operator name are checked against the operator table only
/// when [`ConditionSet::resolve`] runs at terminal time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    entries: Vec<Entry>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) {
        self.entries.push(Entry::Resolved(condition));
    }

    /// Record a condition by operator name without checking the name.
    pub fn push_named(
        &mut self,
        operator: impl Into<String>,
        field: Option<Field>,
        value: Value,
        extra_value: Option<Value>,
    ) {
        self.entries.push(Entry::Named {
            operator: operator.into(),
            field,
            value,
            extra_value,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the wire sequence in insertion order.
    ///
    /// Fails with [`QueryError::InvalidOperator`] on the first unknown operator name,
    /// and with [`QueryError::Validation`] when a named paging entry carries an
    /// out-of-range value or a named `between` has no upper bound.
    pub fn resolve(&self) -> Result<Vec<Condition>, QueryError> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Resolved(condition) => Ok(condition.clone()),
                Entry::Named {
                    operator,
                    field,
                    value,
                    extra_value,
                } => {
                    let op = Operator::from_name(operator)
                        .ok_or_else(|| QueryError::InvalidOperator(operator.clone()))?;
                    if op.kind() == OperatorKind::Paging {
                        let n = value.as_i64().ok_or_else(|| {
                            QueryError::Validation(format!(
                                "{} requires an integer value, got {}",
                                op, value
                            ))
                        })?;
                        return match op {
                            Operator::Limit => Condition::limit(n),
                            _ => Condition::skip(n),
                        };
                    }
                    if op == Operator::Between && extra_value.is_none() {
                        return Err(QueryError::Validation(
                            "between requires an upper bound".to_string(),
                        ));
                    }
                    Ok(Condition {
                        field: field.clone(),
                        operator: op,
                        value: value.clone(),
                        extra_value: extra_value.clone(),
                    })
                }
            })
            .collect()
    }
}
