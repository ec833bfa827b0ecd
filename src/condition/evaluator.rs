use super::resolver::{ValueResolver, stringify};
use super::{BranchCondition, BranchOperator, ConditionGroup};
use crate::error::EvaluationError;
use crate::trace::{ConditionTrace, GroupTrace};
use serde_json::Value;

/// Evaluates branch conditions against values supplied by a resolver.
pub struct ConditionEvaluator<'a> {
    resolver: &'a dyn ValueResolver,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(resolver: &'a dyn ValueResolver) -> Self {
        Self { resolver }
    }

    /// OR over the groups, AND within each group. Evaluation stops at the
    /// first true group, and within a group at the first false condition.
    /// No groups at all means the branch is never eligible.
    pub fn evaluate_groups(
        &self,
        groups: &[ConditionGroup],
    ) -> Result<(bool, Vec<GroupTrace>), EvaluationError> {
        let mut traces = Vec::with_capacity(groups.len());
        for group in groups {
            let trace = self.evaluate_group(group)?;
            let outcome = trace.outcome;
            traces.push(trace);
            if outcome {
                return Ok((true, traces));
            }
        }
        Ok((false, traces))
    }

    pub fn evaluate_group(&self, group: &[BranchCondition]) -> Result<GroupTrace, EvaluationError> {
        let mut conditions = Vec::with_capacity(group.len());
        let mut outcome = true;
        for condition in group {
            if !outcome {
                conditions.push(ConditionTrace::NotEvaluated);
                continue;
            }
            let trace = self.evaluate_condition(condition)?;
            outcome = trace.outcome().unwrap_or(false);
            conditions.push(trace);
        }
        Ok(GroupTrace {
            conditions,
            outcome,
        })
    }

    pub fn evaluate_condition(
        &self,
        condition: &BranchCondition,
    ) -> Result<ConditionTrace, EvaluationError> {
        let operator = condition.operator;
        let first = self.resolver.resolve(&condition.first_value);
        let second = if operator.requires_second_value() {
            let source = condition
                .second_value
                .as_ref()
                .ok_or(EvaluationError::MissingOperand {
                    operator,
                    operand: "secondValue",
                })?;
            Some((source.clone(), self.resolver.resolve(source)))
        } else {
            None
        };
        let case_sensitive = operator.honours_case() && condition.case_sensitive.unwrap_or(false);
        let second_value = second.as_ref().map(|(_, value)| value);

        let outcome = match operator {
            BranchOperator::TextContains
            | BranchOperator::TextDoesNotContain
            | BranchOperator::TextExactlyMatches
            | BranchOperator::TextDoesNotExactlyMatch
            | BranchOperator::TextStartsWith
            | BranchOperator::TextDoesNotStartWith
            | BranchOperator::TextEndsWith
            | BranchOperator::TextDoesNotEndWith => {
                let left = fold_case(stringify(&first), case_sensitive);
                let right = fold_case(second_value.map(stringify).unwrap_or_default(), case_sensitive);
                match operator {
                    BranchOperator::TextContains => left.contains(&right),
                    BranchOperator::TextDoesNotContain => !left.contains(&right),
                    BranchOperator::TextExactlyMatches => left == right,
                    BranchOperator::TextDoesNotExactlyMatch => left != right,
                    BranchOperator::TextStartsWith => left.starts_with(&right),
                    BranchOperator::TextDoesNotStartWith => !left.starts_with(&right),
                    BranchOperator::TextEndsWith => left.ends_with(&right),
                    _ => !left.ends_with(&right),
                }
            }
            BranchOperator::NumberIsGreaterThan
            | BranchOperator::NumberIsLessThan
            | BranchOperator::NumberIsEqualTo => {
                let left = to_number(operator, &first)?;
                let right = to_number(operator, second_value.unwrap_or(&Value::Null))?;
                match operator {
                    BranchOperator::NumberIsGreaterThan => left > right,
                    BranchOperator::NumberIsLessThan => left < right,
                    _ => left == right,
                }
            }
            BranchOperator::BooleanIsTrue => is_truthy(&first),
            BranchOperator::BooleanIsFalse => !is_truthy(&first),
            BranchOperator::ListContains | BranchOperator::ListDoesNotContain => {
                // List items compare exactly, whatever `caseSensitive` says.
                let items = to_list(operator, &first)?;
                let needle = second_value.map(stringify).unwrap_or_default();
                let found = items.iter().any(|item| stringify(item) == needle);
                if operator == BranchOperator::ListContains {
                    found
                } else {
                    !found
                }
            }
            BranchOperator::ListIsEmpty => to_list(operator, &first)?.is_empty(),
            BranchOperator::ListIsNotEmpty => !to_list(operator, &first)?.is_empty(),
            BranchOperator::Exists => exists(&first),
            BranchOperator::DoesNotExist => !exists(&first),
        };

        Ok(ConditionTrace::Evaluated {
            operator,
            first_source: condition.first_value.clone(),
            first,
            second,
            outcome,
        })
    }
}

fn fold_case(text: String, case_sensitive: bool) -> String {
    if case_sensitive {
        text
    } else {
        text.to_lowercase()
    }
}

/// Numbers and numeric strings coerce; anything else is an error.
fn to_number(operator: BranchOperator, value: &Value) -> Result<f64, EvaluationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| EvaluationError::NotANumber {
            operator,
            found: value.clone(),
        })
}

/// Arrays, JSON-encoded arrays in strings, and `null` as the empty list.
fn to_list(operator: BranchOperator, value: &Value) -> Result<Vec<Value>, EvaluationError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Ok(items),
            _ => Err(EvaluationError::NotAList {
                operator,
                found: value.clone(),
            }),
        },
        _ => Err(EvaluationError::NotAList {
            operator,
            found: value.clone(),
        }),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("false") && trimmed != "0"
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn exists(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
