//! Records of how router branches were evaluated, and their text rendering.

use crate::condition::BranchOperator;
use crate::router::BranchType;
use serde_json::Value;

mod formatter;

pub use formatter::TraceFormatter;

/// How a single condition was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTrace {
    Evaluated {
        operator: BranchOperator,
        first_source: String,
        first: Value,
        second: Option<(String, Value)>,
        outcome: bool,
    },
    /// Skipped because an earlier condition of the group was false.
    NotEvaluated,
}

impl ConditionTrace {
    pub fn outcome(&self) -> Option<bool> {
        match self {
            ConditionTrace::Evaluated { outcome, .. } => Some(*outcome),
            ConditionTrace::NotEvaluated => None,
        }
    }
}

/// How one AND-group was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTrace {
    pub conditions: Vec<ConditionTrace>,
    pub outcome: bool,
}

/// How one branch was evaluated. Groups after the first true one are not
/// evaluated and therefore absent.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTrace {
    pub index: usize,
    pub branch_name: String,
    pub branch_type: BranchType,
    pub eligible: bool,
    pub groups: Vec<GroupTrace>,
}
