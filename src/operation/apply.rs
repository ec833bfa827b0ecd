use super::{FlowOperation, StepLocation};
use crate::error::{FlowError, InvariantViolation, StructuralError};
use crate::router::RouterSettings;
use crate::step::{SequentialNamer, Slot, StepGraph, StepId, StepNamer, StepSettings};
use crate::version::{FlowVersion, VersionState};
use ahash::AHashSet;

/// The version produced by an operation, plus the names of steps it discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub version: FlowVersion,
    pub removed_steps: Vec<String>,
}

impl FlowVersion {
    /// Applies a version-level operation with the default step namer.
    pub fn apply(&self, operation: &FlowOperation) -> Result<OperationOutcome, FlowError> {
        self.apply_with(operation, &SequentialNamer::default())
    }

    /// Applies a version-level operation, minting new step names with `namer`.
    ///
    /// The receiver is never modified. On error no new version exists, so a
    /// rejected operation leaves the caller's version exactly as it was.
    pub fn apply_with(
        &self,
        operation: &FlowOperation,
        namer: &dyn StepNamer,
    ) -> Result<OperationOutcome, FlowError> {
        if self.state() == VersionState::Locked {
            return Err(InvariantViolation::VersionLocked { id: self.id() }.into());
        }

        let mut mutation = Mutation {
            graph: self.graph().clone(),
            display_name: self.display_name().to_string(),
            namer,
            removed: Vec::new(),
        };

        if let Err(err) = mutation.run(operation) {
            log::warn!(
                "Rejected {} on flow version {}: {}",
                operation.kind(),
                self.id(),
                err
            );
            return Err(err);
        }

        let version = self.with_content(mutation.display_name, mutation.graph);
        log::debug!(
            "Applied {} to flow version {} (valid: {})",
            operation.kind(),
            version.id(),
            version.is_valid()
        );
        Ok(OperationOutcome {
            version,
            removed_steps: mutation.removed,
        })
    }
}

/// Working copy of a version's content while one operation is applied.
pub(super) struct Mutation<'a> {
    pub(super) graph: StepGraph,
    pub(super) display_name: String,
    pub(super) namer: &'a dyn StepNamer,
    pub(super) removed: Vec<String>,
}

impl<'a> Mutation<'a> {
    fn run(&mut self, operation: &FlowOperation) -> Result<(), FlowError> {
        match operation {
            FlowOperation::ChangeName(request) => {
                self.display_name = request.display_name.clone();
                Ok(())
            }
            FlowOperation::UpdateTrigger(request) => self.update_trigger(request),
            FlowOperation::AddAction(request) => self.add_action(request),
            FlowOperation::UpdateAction(request) => self.update_action(request),
            FlowOperation::DeleteAction(request) => self.delete_actions(request),
            FlowOperation::DuplicateAction(request) => self.duplicate_action(request),
            FlowOperation::MoveAction(request) => self.move_action(request),
            FlowOperation::AddBranch(request) => {
                self.add_branch(&request.step_name, request.branch_index, &request.branch_name)
            }
            FlowOperation::DeleteBranch(request) => {
                self.delete_branch(&request.step_name, request.branch_index)
            }
            FlowOperation::DuplicateBranch(request) => {
                self.duplicate_branch(&request.step_name, request.branch_index)
            }
            FlowOperation::AddPath(request) => self.add_path(request),
            FlowOperation::DeletePath(request) => self.delete_path(request),
            FlowOperation::LockAndPublish(_) => Err(InvariantViolation::FlowLevelOperation {
                operation: "LOCK_AND_PUBLISH",
            }
            .into()),
            FlowOperation::UseAsDraft(_) => Err(InvariantViolation::FlowLevelOperation {
                operation: "USE_AS_DRAFT",
            }
            .into()),
        }
    }

    pub(super) fn find(&self, name: &str) -> Result<StepId, FlowError> {
        self.graph.find(name).ok_or_else(|| {
            StructuralError::StepNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Resolves a name to a non-trigger step.
    pub(super) fn find_action(&self, name: &str) -> Result<StepId, FlowError> {
        let id = self.find(name)?;
        if id == self.graph.trigger_id() {
            return Err(InvariantViolation::TriggerImmovable {
                name: name.to_string(),
            }
            .into());
        }
        Ok(id)
    }

    /// Resolves a name to a router step. Names of other steps do not resolve.
    pub(super) fn find_router(&self, name: &str) -> Result<StepId, FlowError> {
        self.graph
            .find(name)
            .filter(|id| {
                self.graph
                    .get(*id)
                    .is_some_and(|step| step.is_router())
            })
            .ok_or_else(|| {
                StructuralError::StepNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    pub(super) fn router(&self, id: StepId) -> Result<&RouterSettings, FlowError> {
        self.graph
            .get(id)
            .and_then(|step| step.settings.as_router())
            .ok_or_else(|| {
                StructuralError::StepNotFound {
                    name: id.to_string(),
                }
                .into()
            })
    }

    pub(super) fn router_mut(&mut self, id: StepId) -> Result<&mut RouterSettings, FlowError> {
        self.graph
            .get_mut(id)
            .and_then(|step| step.settings.as_router_mut())
            .ok_or_else(|| {
                StructuralError::StepNotFound {
                    name: id.to_string(),
                }
                .into()
            })
    }

    pub(super) fn taken_names(&self) -> AHashSet<String> {
        self.graph.names()
    }

    /// Uses the requested name if free, otherwise mints one.
    pub(super) fn claim_name(&self, requested: Option<&str>) -> Result<String, FlowError> {
        let taken = self.taken_names();
        match requested.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) if taken.contains(name) => Err(StructuralError::DuplicateStepName {
                name: name.to_string(),
            }
            .into()),
            Some(name) => Ok(name.to_string()),
            None => Ok(self.namer.mint(&taken)),
        }
    }

    /// Resolves where a step goes relative to `parent_name`.
    pub(super) fn resolve_slot(
        &self,
        parent_name: &str,
        location: StepLocation,
        branch_index: Option<usize>,
    ) -> Result<Slot, FlowError> {
        let parent = self.find(parent_name)?;
        match location {
            StepLocation::After => Ok(Slot::After(parent)),
            StepLocation::InsideBranch => {
                let router = self.find_router(parent_name)?;
                let len = self.router(router)?.branches.len();
                match branch_index {
                    Some(index) if index < len => Ok(Slot::Branch { router, index }),
                    Some(index) => Err(StructuralError::BranchIndexOutOfRange {
                        step_name: parent_name.to_string(),
                        index,
                        len,
                    }
                    .into()),
                    None => Err(StructuralError::MissingBranchIndex {
                        step_name: parent_name.to_string(),
                    }
                    .into()),
                }
            }
            StepLocation::InsideLoop => match self.graph.get(parent).map(|step| &step.settings) {
                Some(StepSettings::LoopOnItems(_)) => Ok(Slot::Loop(parent)),
                _ => Err(StructuralError::NotALoop {
                    name: parent_name.to_string(),
                }
                .into()),
            },
        }
    }

    /// Drops a whole chain (with every nested child chain) from the arena.
    pub(super) fn discard_chain(&mut self, head: Option<StepId>) {
        let ids = self.graph.chain(head);
        let names = self.graph.remove_all(&ids);
        self.removed.extend(names);
    }

    /// Drops a step with its child chains, leaving its successors alone.
    pub(super) fn discard_subtree(&mut self, id: StepId) {
        let ids = self.graph.subtree(id);
        let names = self.graph.remove_all(&ids);
        self.removed.extend(names);
    }
}
