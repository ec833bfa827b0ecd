//! Branch conditions: the operator vocabulary, value resolution and evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

mod evaluator;
mod resolver;

pub use evaluator::*;
pub use resolver::*;

/// Comparison operators available to router branch conditions.
///
/// The serialized names are part of the persisted step settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchOperator {
    // Text
    TextContains,
    TextDoesNotContain,
    TextExactlyMatches,
    TextDoesNotExactlyMatch,
    TextStartsWith,
    TextDoesNotStartWith,
    TextEndsWith,
    TextDoesNotEndWith,

    // Number
    NumberIsGreaterThan,
    NumberIsLessThan,
    NumberIsEqualTo,

    // Boolean
    BooleanIsTrue,
    BooleanIsFalse,

    // List
    ListContains,
    ListDoesNotContain,
    ListIsEmpty,
    ListIsNotEmpty,

    // Existence
    Exists,
    DoesNotExist,
}

impl BranchOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchOperator::TextContains => "TEXT_CONTAINS",
            BranchOperator::TextDoesNotContain => "TEXT_DOES_NOT_CONTAIN",
            BranchOperator::TextExactlyMatches => "TEXT_EXACTLY_MATCHES",
            BranchOperator::TextDoesNotExactlyMatch => "TEXT_DOES_NOT_EXACTLY_MATCH",
            BranchOperator::TextStartsWith => "TEXT_STARTS_WITH",
            BranchOperator::TextDoesNotStartWith => "TEXT_DOES_NOT_START_WITH",
            BranchOperator::TextEndsWith => "TEXT_ENDS_WITH",
            BranchOperator::TextDoesNotEndWith => "TEXT_DOES_NOT_END_WITH",
            BranchOperator::NumberIsGreaterThan => "NUMBER_IS_GREATER_THAN",
            BranchOperator::NumberIsLessThan => "NUMBER_IS_LESS_THAN",
            BranchOperator::NumberIsEqualTo => "NUMBER_IS_EQUAL_TO",
            BranchOperator::BooleanIsTrue => "BOOLEAN_IS_TRUE",
            BranchOperator::BooleanIsFalse => "BOOLEAN_IS_FALSE",
            BranchOperator::ListContains => "LIST_CONTAINS",
            BranchOperator::ListDoesNotContain => "LIST_DOES_NOT_CONTAIN",
            BranchOperator::ListIsEmpty => "LIST_IS_EMPTY",
            BranchOperator::ListIsNotEmpty => "LIST_IS_NOT_EMPTY",
            BranchOperator::Exists => "EXISTS",
            BranchOperator::DoesNotExist => "DOES_NOT_EXIST",
        }
    }

    /// Short human-readable form used in evaluation traces.
    pub fn symbol(&self) -> &'static str {
        match self {
            BranchOperator::TextContains => "contains",
            BranchOperator::TextDoesNotContain => "does not contain",
            BranchOperator::TextExactlyMatches => "=",
            BranchOperator::TextDoesNotExactlyMatch => "!=",
            BranchOperator::TextStartsWith => "starts with",
            BranchOperator::TextDoesNotStartWith => "does not start with",
            BranchOperator::TextEndsWith => "ends with",
            BranchOperator::TextDoesNotEndWith => "does not end with",
            BranchOperator::NumberIsGreaterThan => ">",
            BranchOperator::NumberIsLessThan => "<",
            BranchOperator::NumberIsEqualTo => "==",
            BranchOperator::BooleanIsTrue => "is true",
            BranchOperator::BooleanIsFalse => "is false",
            BranchOperator::ListContains => "has item",
            BranchOperator::ListDoesNotContain => "lacks item",
            BranchOperator::ListIsEmpty => "is empty",
            BranchOperator::ListIsNotEmpty => "is not empty",
            BranchOperator::Exists => "exists",
            BranchOperator::DoesNotExist => "does not exist",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            BranchOperator::TextContains
                | BranchOperator::TextDoesNotContain
                | BranchOperator::TextExactlyMatches
                | BranchOperator::TextDoesNotExactlyMatch
                | BranchOperator::TextStartsWith
                | BranchOperator::TextDoesNotStartWith
                | BranchOperator::TextEndsWith
                | BranchOperator::TextDoesNotEndWith
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            BranchOperator::NumberIsGreaterThan
                | BranchOperator::NumberIsLessThan
                | BranchOperator::NumberIsEqualTo
        )
    }

    /// Operators that compare `firstValue` against `secondValue`.
    pub fn requires_second_value(&self) -> bool {
        self.is_text()
            || self.is_numeric()
            || matches!(
                self,
                BranchOperator::ListContains | BranchOperator::ListDoesNotContain
            )
    }

    /// Operators for which `caseSensitive` changes the outcome. Only text operators do.
    pub fn honours_case(&self) -> bool {
        self.is_text()
    }
}

impl fmt::Display for BranchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison. Operands are expressions handed to a `ValueResolver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCondition {
    pub first_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<String>,
    pub operator: BranchOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl BranchCondition {
    pub fn new(first_value: impl Into<String>, operator: BranchOperator) -> Self {
        Self {
            first_value: first_value.into(),
            second_value: None,
            operator,
            case_sensitive: None,
        }
    }

    pub fn with_second(mut self, second_value: impl Into<String>) -> Self {
        self.second_value = Some(second_value.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Name of the operand this condition lacks, if any.
    pub fn missing_operand(&self) -> Option<&'static str> {
        if self.operator.requires_second_value() && self.second_value.is_none() {
            Some("secondValue")
        } else {
            None
        }
    }
}

/// Conditions joined with AND. A branch holds a list of groups joined with OR.
pub type ConditionGroup = Vec<BranchCondition>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_round_trip() {
        for op in [
            BranchOperator::TextStartsWith,
            BranchOperator::NumberIsGreaterThan,
            BranchOperator::ListIsNotEmpty,
            BranchOperator::DoesNotExist,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
            let back: BranchOperator = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn unary_operators_do_not_need_second_value() {
        assert_eq!(
            BranchCondition::new("{{x}}", BranchOperator::Exists).missing_operand(),
            None
        );
        assert_eq!(
            BranchCondition::new("{{x}}", BranchOperator::TextContains).missing_operand(),
            Some("secondValue")
        );
    }
}
