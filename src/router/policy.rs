use super::{Branch, ExecutionType};

/// Picks the branches to run from their eligibility, in declaration order.
///
/// `eligibility[i]` is the evaluated outcome of `branches[i]`; the entry of
/// the fallback branch is ignored. The fallback runs only when no condition
/// branch is eligible. Missing entries count as not eligible.
pub fn select_branches(
    execution_type: ExecutionType,
    branches: &[Branch],
    eligibility: &[bool],
) -> Vec<usize> {
    let mut matches = branches
        .iter()
        .enumerate()
        .filter(|(_, branch)| !branch.is_fallback())
        .filter(|(index, _)| eligibility.get(*index).copied().unwrap_or(false))
        .map(|(index, _)| index);

    let selected: Vec<usize> = match execution_type {
        ExecutionType::ExecuteFirstMatch => matches.next().into_iter().collect(),
        ExecutionType::ExecuteAllMatch => matches.collect(),
    };

    if selected.is_empty() {
        branches
            .iter()
            .position(Branch::is_fallback)
            .into_iter()
            .collect()
    } else {
        selected
    }
}
