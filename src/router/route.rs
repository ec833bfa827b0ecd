use super::{BranchType, RouterSettings, select_branches};
use crate::condition::{ConditionEvaluator, ValueResolver};
use crate::error::EvaluationError;
use crate::trace::{BranchTrace, TraceFormatter};

/// Outcome of routing: which branches run, and how each branch was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub selected: Vec<usize>,
    pub branches: Vec<BranchTrace>,
}

impl RouteDecision {
    pub fn fallback_taken(&self) -> bool {
        self.selected.iter().any(|index| {
            self.branches
                .get(*index)
                .is_some_and(|trace| trace.branch_type == BranchType::Fallback)
        })
    }

    /// One line per selected branch: its name and why it was taken.
    pub fn reasons(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|index| self.branches.get(*index))
            .map(|trace| {
                format!(
                    "{}: {}",
                    trace.branch_name,
                    TraceFormatter::format_branch(trace)
                )
            })
            .collect()
    }
}

/// Evaluates every condition branch of a router, then applies its execution policy.
///
/// All condition branches are evaluated before selection, so an evaluation
/// error anywhere in the router surfaces regardless of the policy.
pub fn route(
    router: &RouterSettings,
    resolver: &dyn ValueResolver,
) -> Result<RouteDecision, EvaluationError> {
    let evaluator = ConditionEvaluator::new(resolver);
    let mut traces = Vec::with_capacity(router.branches.len());

    for (index, branch) in router.branches.iter().enumerate() {
        let (eligible, groups) = if branch.is_fallback() {
            (true, Vec::new())
        } else {
            evaluator.evaluate_groups(&branch.conditions)?
        };
        traces.push(BranchTrace {
            index,
            branch_name: branch.branch_name.clone(),
            branch_type: branch.branch_type,
            eligible,
            groups,
        });
    }

    let eligibility: Vec<bool> = traces.iter().map(|trace| trace.eligible).collect();
    let selected = select_branches(router.execution_type, &router.branches, &eligibility);
    log::debug!(
        "Router ({:?}) selected branches {:?}",
        router.execution_type,
        selected
    );

    Ok(RouteDecision {
        selected,
        branches: traces,
    })
}
