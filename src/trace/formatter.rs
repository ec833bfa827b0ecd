use super::{BranchTrace, ConditionTrace, GroupTrace};
use crate::router::BranchType;
use itertools::Itertools;
use serde_json::Value;

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Explains why a branch was or was not eligible.
    pub fn format_branch(trace: &BranchTrace) -> String {
        if trace.branch_type == BranchType::Fallback {
            return "otherwise".to_string();
        }
        if trace.groups.is_empty() {
            return "no conditions".to_string();
        }
        let parenthesize = trace.groups.len() > 1;
        trace
            .groups
            .iter()
            .map(|group| Self::format_group(group, parenthesize))
            .join(" OR ")
    }

    /// Renders the evaluated conditions of a group joined with AND.
    pub fn format_group(group: &GroupTrace, parenthesize: bool) -> String {
        let parts: Vec<String> = group
            .conditions
            .iter()
            .filter_map(Self::format_condition)
            .collect();
        if parenthesize && parts.len() > 1 {
            format!("({})", parts.join(" AND "))
        } else {
            parts.join(" AND ")
        }
    }

    /// Renders one condition; skipped conditions render as nothing.
    pub fn format_condition(trace: &ConditionTrace) -> Option<String> {
        match trace {
            ConditionTrace::Evaluated {
                operator,
                first_source,
                first,
                second,
                ..
            } => {
                let left = Self::format_operand(first_source, first);
                Some(match second {
                    Some((source, value)) => format!(
                        "{} {} {}",
                        left,
                        operator.symbol(),
                        Self::format_operand(source, value)
                    ),
                    None => format!("{} {}", left, operator.symbol()),
                })
            }
            ConditionTrace::NotEvaluated => None,
        }
    }

    /// Templated operands show the value they resolved to.
    fn format_operand(source: &str, value: &Value) -> String {
        if source.contains("{{") {
            format!("{} (was {})", source, Self::format_value(value))
        } else {
            source.to_string()
        }
    }

    /// Format a value for display.
    fn format_value(value: &Value) -> String {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                _ => n.to_string(),
            },
            Value::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }
}
