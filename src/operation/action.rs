use super::apply::Mutation;
use super::{
    ActionSettingsDraft, AddActionRequest, DeleteActionRequest, DuplicateActionRequest,
    MoveActionRequest, TriggerDraft, UpdateActionRequest, UpdateTriggerRequest,
};
use crate::error::{FlowError, InvariantViolation, StructuralError};
use crate::router::{Branch, RouterSettings};
use crate::step::{LoopSettings, Slot, StepSettings};

impl<'a> Mutation<'a> {
    pub(super) fn update_trigger(&mut self, request: &UpdateTriggerRequest) -> Result<(), FlowError> {
        let trigger_id = self.graph.trigger_id();
        let settings = match &request.settings {
            TriggerDraft::Empty => StepSettings::Empty,
            TriggerDraft::PieceTrigger(settings) => StepSettings::PieceTrigger(settings.clone()),
        };
        if let Some(trigger) = self.graph.get_mut(trigger_id) {
            trigger.display_name = request.display_name.clone();
            trigger.settings = settings;
        }
        Ok(())
    }

    pub(super) fn add_action(&mut self, request: &AddActionRequest) -> Result<(), FlowError> {
        let slot = self.resolve_slot(
            &request.parent_step,
            request.step_location_relative_to_parent,
            request.branch_index,
        )?;
        let name = self.claim_name(request.action.name.as_deref())?;
        let settings = settings_from_draft(&name, &request.action.settings)?;

        let id = self
            .graph
            .insert(name, request.action.display_name.clone(), settings);
        self.graph.attach(slot, id);
        Ok(())
    }

    /// Replaces a step's settings. Children survive when the kind allows it:
    /// a loop keeps its body, a router keeps branch children by position.
    pub(super) fn update_action(&mut self, request: &UpdateActionRequest) -> Result<(), FlowError> {
        let id = self.find(&request.name)?;
        if id == self.graph.trigger_id() {
            return Err(StructuralError::TriggerNotAllowed {
                name: request.name.clone(),
            }
            .into());
        }
        let mut settings = settings_from_draft(&request.name, &request.settings)?;
        let Some(current) = self.graph.get(id).map(|step| step.settings.clone()) else {
            return Err(StructuralError::StepNotFound {
                name: request.name.clone(),
            }
            .into());
        };

        match (&current, &mut settings) {
            (StepSettings::LoopOnItems(old), StepSettings::LoopOnItems(new)) => {
                new.first_loop_action = old.first_loop_action;
            }
            (StepSettings::Router(old), StepSettings::Router(new)) => {
                if old.branches.len() != new.branches.len() {
                    return Err(InvariantViolation::BranchCountMismatch {
                        step_name: request.name.clone(),
                        current: old.branches.len(),
                        provided: new.branches.len(),
                    }
                    .into());
                }
                for (old_branch, new_branch) in old.branches.iter().zip(new.branches.iter_mut()) {
                    new_branch.child = old_branch.child;
                }
            }
            _ => {
                for head in current.children() {
                    self.discard_chain(Some(head));
                }
            }
        }

        if let Some(step) = self.graph.get_mut(id) {
            step.display_name = request.display_name.clone();
            step.settings = settings;
        }
        Ok(())
    }

    /// Splices each named step out of its chain and discards its children.
    /// Names already discarded as part of an earlier step are skipped.
    pub(super) fn delete_actions(&mut self, request: &DeleteActionRequest) -> Result<(), FlowError> {
        for name in &request.names {
            if self.removed.iter().any(|removed| removed == name) {
                continue;
            }
            let id = self.find_action(name)?;
            self.graph.detach(id);
            self.discard_subtree(id);
        }
        Ok(())
    }

    pub(super) fn duplicate_action(
        &mut self,
        request: &DuplicateActionRequest,
    ) -> Result<(), FlowError> {
        let id = self.find_action(&request.step_name)?;
        let mut taken = self.taken_names();
        let Some(copy) = self.graph.copy_step_tree(id, self.namer, &mut taken) else {
            return Err(StructuralError::StepNotFound {
                name: request.step_name.clone(),
            }
            .into());
        };
        self.graph.attach(Slot::After(id), copy);
        Ok(())
    }

    pub(super) fn move_action(&mut self, request: &MoveActionRequest) -> Result<(), FlowError> {
        let id = self.find_action(&request.name)?;
        let parent = self.find(&request.new_parent_step)?;
        if self.graph.subtree(id).contains(&parent) {
            return Err(InvariantViolation::MoveIntoOwnSubtree {
                name: request.name.clone(),
            }
            .into());
        }
        let slot = self.resolve_slot(
            &request.new_parent_step,
            request.step_location_relative_to_parent,
            request.branch_index,
        )?;
        self.graph.detach(id);
        self.graph.attach(slot, id);
        Ok(())
    }
}

/// Builds stored settings from a draft, checking router drafts up front.
fn settings_from_draft(
    step_name: &str,
    draft: &ActionSettingsDraft,
) -> Result<StepSettings, StructuralError> {
    Ok(match draft {
        ActionSettingsDraft::Piece(settings) => StepSettings::Piece(settings.clone()),
        ActionSettingsDraft::Code(settings) => StepSettings::Code(settings.clone()),
        ActionSettingsDraft::LoopOnItems(draft) => StepSettings::LoopOnItems(LoopSettings {
            items: draft.items.clone(),
            first_loop_action: None,
        }),
        ActionSettingsDraft::Router(draft) => {
            let router = if draft.branches.is_empty() {
                RouterSettings {
                    execution_type: draft.execution_type,
                    ..RouterSettings::default()
                }
            } else {
                RouterSettings {
                    execution_type: draft.execution_type,
                    branches: draft.branches.iter().cloned().map(Branch::from).collect(),
                }
            };
            router.check_structure(step_name)?;
            router.check_operands(step_name)?;
            StepSettings::Router(router)
        }
    })
}
