//! The flow operation protocol: a closed set of commands that rewrite a draft
//! flow version into a new one.
//!
//! Operations travel as `{"type": "ADD_BRANCH", "request": {...}}`. Version-level
//! operations are applied with [`FlowVersion::apply`](crate::version::FlowVersion::apply);
//! `LOCK_AND_PUBLISH` and `USE_AS_DRAFT` change the flow itself and go through
//! [`FlowEditor`](crate::version::FlowEditor).

use crate::condition::ConditionGroup;
use crate::router::{Branch, BranchType, ExecutionType};
use crate::step::{CodeSettings, PieceSettings, PieceTriggerSettings};
use crate::version::VersionId;
use serde::{Deserialize, Serialize};

mod action;
mod apply;
mod branch;
pub(crate) mod validity;

pub use apply::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "request", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowOperation {
    ChangeName(ChangeNameRequest),
    UpdateTrigger(UpdateTriggerRequest),
    AddAction(AddActionRequest),
    UpdateAction(UpdateActionRequest),
    DeleteAction(DeleteActionRequest),
    DuplicateAction(DuplicateActionRequest),
    MoveAction(MoveActionRequest),
    AddBranch(AddBranchRequest),
    DeleteBranch(DeleteBranchRequest),
    DuplicateBranch(DuplicateBranchRequest),
    AddPath(AddPathRequest),
    DeletePath(DeletePathRequest),
    LockAndPublish(LockAndPublishRequest),
    UseAsDraft(UseAsDraftRequest),
}

impl FlowOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            FlowOperation::ChangeName(_) => "CHANGE_NAME",
            FlowOperation::UpdateTrigger(_) => "UPDATE_TRIGGER",
            FlowOperation::AddAction(_) => "ADD_ACTION",
            FlowOperation::UpdateAction(_) => "UPDATE_ACTION",
            FlowOperation::DeleteAction(_) => "DELETE_ACTION",
            FlowOperation::DuplicateAction(_) => "DUPLICATE_ACTION",
            FlowOperation::MoveAction(_) => "MOVE_ACTION",
            FlowOperation::AddBranch(_) => "ADD_BRANCH",
            FlowOperation::DeleteBranch(_) => "DELETE_BRANCH",
            FlowOperation::DuplicateBranch(_) => "DUPLICATE_BRANCH",
            FlowOperation::AddPath(_) => "ADD_PATH",
            FlowOperation::DeletePath(_) => "DELETE_PATH",
            FlowOperation::LockAndPublish(_) => "LOCK_AND_PUBLISH",
            FlowOperation::UseAsDraft(_) => "USE_AS_DRAFT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNameRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTriggerRequest {
    pub display_name: String,
    pub settings: TriggerDraft,
}

/// Where an added or moved step goes, relative to its parent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepLocation {
    After,
    InsideBranch,
    InsideLoop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActionRequest {
    pub parent_step: String,
    pub step_location_relative_to_parent: StepLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_index: Option<usize>,
    pub action: ActionDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActionRequest {
    pub name: String,
    pub display_name: String,
    pub settings: ActionSettingsDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActionRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateActionRequest {
    pub step_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveActionRequest {
    pub name: String,
    pub new_parent_step: String,
    pub step_location_relative_to_parent: StepLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBranchRequest {
    pub step_name: String,
    pub branch_index: usize,
    pub branch_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBranchRequest {
    pub step_name: String,
    pub branch_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateBranchRequest {
    pub step_name: String,
    pub branch_index: usize,
}

/// Adds a condition branch directly before the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPathRequest {
    pub step_name: String,
    pub branch_name: String,
}

/// Removes the condition branch directly before the fallback. A given
/// `branchIndex` must name that branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePathRequest {
    pub step_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LockAndPublishRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseAsDraftRequest {
    pub version_id: VersionId,
}

/// Trigger settings as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerDraft {
    Empty,
    PieceTrigger(PieceTriggerSettings),
}

/// An action as submitted by a client or a planning assistant. Drafts never
/// carry step references; child chains are built with further operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDraft {
    /// Requested step name; one is minted when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub display_name: String,
    pub settings: ActionSettingsDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionSettingsDraft {
    Piece(PieceSettings),
    Code(CodeSettings),
    LoopOnItems(LoopDraft),
    Router(RouterDraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopDraft {
    pub items: String,
}

/// Router settings without child chains. No branches means the default
/// condition/fallback pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterDraft {
    #[serde(default)]
    pub execution_type: ExecutionType,
    #[serde(default)]
    pub branches: Vec<BranchDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDraft {
    pub branch_name: String,
    pub branch_type: BranchType,
    #[serde(default)]
    pub conditions: Vec<ConditionGroup>,
}

impl BranchDraft {
    pub fn condition(branch_name: impl Into<String>, conditions: Vec<ConditionGroup>) -> Self {
        Self {
            branch_name: branch_name.into(),
            branch_type: BranchType::Condition,
            conditions,
        }
    }

    pub fn fallback(branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            branch_type: BranchType::Fallback,
            conditions: Vec::new(),
        }
    }
}

impl From<BranchDraft> for Branch {
    fn from(draft: BranchDraft) -> Self {
        Branch {
            branch_name: draft.branch_name,
            branch_type: draft.branch_type,
            conditions: draft.conditions,
            child: None,
        }
    }
}
