//! Router steps: branch definitions, the execution policy and branch selection.

use crate::condition::ConditionGroup;
use crate::error::StructuralError;
use crate::step::StepId;
use serde::{Deserialize, Serialize};

mod policy;
mod route;

pub use policy::*;
pub use route::*;

pub const DEFAULT_BRANCH_NAME: &str = "Branch 1";
pub const FALLBACK_BRANCH_NAME: &str = "Otherwise";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    Condition,
    Fallback,
}

/// Whether a router runs only the first eligible branch or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    #[default]
    ExecuteFirstMatch,
    ExecuteAllMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_name: String,
    pub branch_type: BranchType,
    #[serde(default)]
    pub conditions: Vec<ConditionGroup>,
    /// Head of the sub-flow run when this branch is taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<StepId>,
}

impl Branch {
    /// A condition branch with no conditions, which never matches until authored.
    pub fn condition(branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            branch_type: BranchType::Condition,
            conditions: Vec::new(),
            child: None,
        }
    }

    pub fn fallback(branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            branch_type: BranchType::Fallback,
            conditions: Vec::new(),
            child: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.branch_type == BranchType::Fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    #[serde(default)]
    pub execution_type: ExecutionType,
    pub branches: Vec<Branch>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            execution_type: ExecutionType::default(),
            branches: vec![
                Branch::condition(DEFAULT_BRANCH_NAME),
                Branch::fallback(FALLBACK_BRANCH_NAME),
            ],
        }
    }
}

impl RouterSettings {
    pub fn fallback_index(&self) -> Option<usize> {
        self.branches.iter().position(Branch::is_fallback)
    }

    /// At least two branches, exactly one fallback, and the fallback last.
    pub fn check_structure(&self, step_name: &str) -> Result<(), StructuralError> {
        let malformed = |reason: &str| StructuralError::MalformedRouter {
            step_name: step_name.to_string(),
            reason: reason.to_string(),
        };
        if self.branches.len() < 2 {
            return Err(malformed("a router needs at least two branches"));
        }
        let fallbacks = self.branches.iter().filter(|b| b.is_fallback()).count();
        if fallbacks != 1 {
            return Err(malformed("a router needs exactly one fallback branch"));
        }
        if self.fallback_index() != Some(self.branches.len() - 1) {
            return Err(malformed("the fallback branch must be the last branch"));
        }
        Ok(())
    }

    /// Rejects conditions lacking an operand their operator needs.
    pub fn check_operands(&self, step_name: &str) -> Result<(), StructuralError> {
        for branch in &self.branches {
            for condition in branch.conditions.iter().flatten() {
                if let Some(operand) = condition.missing_operand() {
                    return Err(StructuralError::MissingOperand {
                        step_name: step_name.to_string(),
                        branch_name: branch.branch_name.clone(),
                        operator: condition.operator,
                        operand,
                    });
                }
            }
        }
        Ok(())
    }
}
