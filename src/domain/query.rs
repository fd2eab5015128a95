//! Abstract query criteria issued by the session layer.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use super::metadata::SortDirection;
use super::value::{Document, Value};

/// Comparison operator inside a structured condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    Exists,
    Regex,
    /// Unrecognised operator; forwarded to the store verbatim.
    Other(String),
}

impl Operator {
    /// Parse an operator name. Accepts short (`gt`), long (`greaterThan`)
    /// and store (`$gt`) spellings.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "eq" | "equal" | "equals" | "$eq" => Operator::Equal,
            "ne" | "notEqual" | "$ne" => Operator::NotEqual,
            "gt" | "greaterThan" | "$gt" => Operator::GreaterThan,
            "gte" | "greaterThanOrEqual" | "$gte" => Operator::GreaterThanOrEqual,
            "lt" | "lessThan" | "$lt" => Operator::LessThan,
            "lte" | "lessThanOrEqual" | "$lte" => Operator::LessThanOrEqual,
            "in" | "$in" => Operator::In,
            "nin" | "notIn" | "$nin" => Operator::NotIn,
            "exists" | "$exists" => Operator::Exists,
            "regex" | "like" | "$regex" => Operator::Regex,
            other => Operator::Other(other.to_string()),
        }
    }

    /// Store-native operator key.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Operator::Equal => "$eq",
            Operator::NotEqual => "$ne",
            Operator::GreaterThan => "$gt",
            Operator::GreaterThanOrEqual => "$gte",
            Operator::LessThan => "$lt",
            Operator::LessThanOrEqual => "$lte",
            Operator::In => "$in",
            Operator::NotIn => "$nin",
            Operator::Exists => "$exists",
            Operator::Regex => "$regex",
            Operator::Other(name) => name,
        }
    }

    /// Whether the operand should be coerced to the field's semantic type.
    #[must_use]
    pub fn takes_field_value(&self) -> bool {
        !matches!(self, Operator::Exists | Operator::Regex | Operator::Other(_))
    }
}

/// Condition on a single field.
///
/// The variant is the classification: an identifier or embedded document
/// passed to [`Condition::Equals`] is never mistaken for an operator set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals(Value),
    Operators(Vec<(Operator, Value)>),
}

impl Condition {
    pub fn equals(value: impl Into<Value>) -> Self {
        Condition::Equals(value.into())
    }

    /// Build a structured condition from `(operator name, operand)` pairs.
    pub fn ops<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Condition::Operators(
            pairs
                .into_iter()
                .map(|(k, v)| (Operator::from_name(k.as_ref()), v.into()))
                .collect(),
        )
    }
}

/// Query against a single entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub conditions: Vec<(String, Condition)>,
    pub sort: Vec<(String, SortDirection)>,
    pub skip: Option<u64>,
    pub limit: Option<NonZeroU64>,
    /// Attach the total number of matching rows, ignoring skip/limit.
    pub count: bool,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((field.into(), condition));
        self
    }

    #[must_use]
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Condition::Equals(value.into()))
    }

    /// Add one operator to a field, merging with an existing operator set.
    #[must_use]
    pub fn where_op(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        operand: impl Into<Value>,
    ) -> Self {
        let field = field.into();
        let operand = operand.into();
        let existing = self.conditions.iter_mut().find(|(f, _)| *f == field);
        match existing {
            Some((_, Condition::Operators(ops))) => ops.push((operator, operand)),
            _ => self
                .conditions
                .push((field, Condition::Operators(vec![(operator, operand)]))),
        }
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Cap the page size. Zero means unrestricted.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = NonZeroU64::new(limit);
        self
    }

    #[must_use]
    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub documents: Vec<Document>,
    /// Total matching rows, present only when the query asked for a count.
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_spellings() {
        assert_eq!(Operator::from_name("greaterThan"), Operator::GreaterThan);
        assert_eq!(Operator::from_name("$lte"), Operator::LessThanOrEqual);
        assert_eq!(Operator::from_name("lt").symbol(), "$lt");
    }

    #[test]
    fn unknown_operator_passes_verbatim() {
        let op = Operator::from_name("$near");
        assert_eq!(op, Operator::Other("$near".to_string()));
        assert_eq!(op.symbol(), "$near");
    }

    #[test]
    fn where_op_merges_same_field() {
        let q = Query::new()
            .where_op("age", Operator::GreaterThan, 18)
            .where_op("age", Operator::LessThan, 65);
        assert_eq!(q.conditions.len(), 1);
        assert_eq!(
            q.conditions[0].1,
            Condition::ops([("gt", 18), ("lt", 65)])
        );
    }

    #[test]
    fn zero_limit_is_unrestricted() {
        assert_eq!(Query::new().limit(0).limit, None);
        assert_eq!(Query::new().limit(5).limit.map(NonZeroU64::get), Some(5));
    }
}
