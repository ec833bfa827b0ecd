use super::apply::Mutation;
use super::{AddPathRequest, DeletePathRequest};
use crate::error::{FlowError, InvariantViolation, StructuralError};
use crate::router::Branch;

impl<'a> Mutation<'a> {
    /// Inserts an empty condition branch at `index`, which must lie at or
    /// before the fallback.
    pub(super) fn add_branch(
        &mut self,
        step_name: &str,
        index: usize,
        branch_name: &str,
    ) -> Result<(), FlowError> {
        let router_id = self.find_router(step_name)?;
        let router = self.router_mut(router_id)?;
        let len = router.branches.len();
        if index >= len {
            return Err(StructuralError::BranchIndexOutOfRange {
                step_name: step_name.to_string(),
                index,
                len,
            }
            .into());
        }
        router.branches.insert(index, Branch::condition(branch_name));
        Ok(())
    }

    /// Removes a condition branch together with its whole child chain.
    pub(super) fn delete_branch(&mut self, step_name: &str, index: usize) -> Result<(), FlowError> {
        let router_id = self.find_router(step_name)?;
        let router = self.router(router_id)?;
        let len = router.branches.len();
        let Some(branch) = router.branches.get(index) else {
            return Err(StructuralError::BranchIndexOutOfRange {
                step_name: step_name.to_string(),
                index,
                len,
            }
            .into());
        };
        if branch.is_fallback() {
            return Err(InvariantViolation::FallbackBranch {
                step_name: step_name.to_string(),
                action: "deleted",
            }
            .into());
        }
        if len <= 2 {
            return Err(InvariantViolation::TooFewBranches {
                step_name: step_name.to_string(),
            }
            .into());
        }

        let removed = self.router_mut(router_id)?.branches.remove(index);
        self.discard_chain(removed.child);
        Ok(())
    }

    /// Inserts a deep copy of a condition branch right after it. Steps in the
    /// copied child chain get fresh names.
    pub(super) fn duplicate_branch(
        &mut self,
        step_name: &str,
        index: usize,
    ) -> Result<(), FlowError> {
        let router_id = self.find_router(step_name)?;
        let router = self.router(router_id)?;
        let len = router.branches.len();
        let Some(source) = router.branches.get(index).cloned() else {
            return Err(StructuralError::BranchIndexOutOfRange {
                step_name: step_name.to_string(),
                index,
                len,
            }
            .into());
        };
        if source.is_fallback() {
            return Err(InvariantViolation::FallbackBranch {
                step_name: step_name.to_string(),
                action: "duplicated",
            }
            .into());
        }

        let mut taken = self.taken_names();
        let child = self.graph.copy_chain(source.child, self.namer, &mut taken);
        let copy = Branch {
            branch_name: format!("{} Copy", source.branch_name),
            branch_type: source.branch_type,
            conditions: source.conditions,
            child,
        };
        self.router_mut(router_id)?.branches.insert(index + 1, copy);
        Ok(())
    }

    /// Adds a condition branch directly before the fallback.
    pub(super) fn add_path(&mut self, request: &AddPathRequest) -> Result<(), FlowError> {
        let router_id = self.find_router(&request.step_name)?;
        let router = self.router(router_id)?;
        router.check_structure(&request.step_name)?;
        let index = router.branches.len() - 1;
        self.add_branch(&request.step_name, index, &request.branch_name)
    }

    /// Deletes the condition branch directly before the fallback.
    pub(super) fn delete_path(&mut self, request: &DeletePathRequest) -> Result<(), FlowError> {
        let router_id = self.find_router(&request.step_name)?;
        let router = self.router(router_id)?;
        router.check_structure(&request.step_name)?;
        let tail = router.branches.len() - 2;
        if let Some(index) = request.branch_index.filter(|index| *index != tail) {
            return Err(InvariantViolation::NotTailAdjacent {
                step_name: request.step_name.clone(),
                index,
            }
            .into());
        }
        self.delete_branch(&request.step_name, tail)
    }
}
