//! Flow versions, the flow that owns them, and the draft/locked lifecycle.

use crate::error::StructuralError;
use crate::operation::validity;
use crate::step::{Step, StepGraph, StepSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

mod flow;
mod lifecycle;
mod store;

pub use flow::*;
pub use lifecycle::*;
pub use store::*;

pub const TRIGGER_STEP_NAME: &str = "trigger";
pub const EMPTY_TRIGGER_DISPLAY_NAME: &str = "Select Trigger";

/// Identity of a flow version. Allocated in increasing order by a `VersionStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub u64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    Draft,
    Locked,
}

/// A problem that keeps a version from being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub step_name: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step_name, self.message)
    }
}

/// A snapshot of a flow's step graph.
///
/// Versions are values: operations return new versions and never touch the
/// one they were applied to. A `LOCKED` version is never replaced in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    id: VersionId,
    flow_id: FlowId,
    display_name: String,
    state: VersionState,
    valid: bool,
    graph: StepGraph,
}

impl FlowVersion {
    /// A trigger-only draft, as created alongside a new flow.
    pub fn new(id: VersionId, flow_id: FlowId, display_name: impl Into<String>) -> Self {
        let graph = StepGraph::new(
            TRIGGER_STEP_NAME,
            EMPTY_TRIGGER_DISPLAY_NAME,
            StepSettings::Empty,
        );
        Self::from_parts(id, flow_id, display_name.into(), VersionState::Draft, graph)
    }

    pub(crate) fn from_parts(
        id: VersionId,
        flow_id: FlowId,
        display_name: String,
        state: VersionState,
        mut graph: StepGraph,
    ) -> Self {
        let valid = validity::recompute(&mut graph);
        Self {
            id,
            flow_id,
            display_name,
            state,
            valid,
            graph,
        }
    }

    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn state(&self) -> VersionState {
        self.state
    }

    pub fn is_draft(&self) -> bool {
        self.state == VersionState::Draft
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn trigger(&self) -> &Step {
        self.graph.trigger()
    }

    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.graph.step(name)
    }

    /// Resolves an action by name; the trigger is not an action.
    pub fn get_action_or_err(&self, name: &str) -> Result<&Step, StructuralError> {
        let step = self
            .graph
            .step(name)
            .ok_or_else(|| StructuralError::StepNotFound {
                name: name.to_string(),
            })?;
        if step.is_trigger() {
            return Err(StructuralError::TriggerNotAllowed {
                name: name.to_string(),
            });
        }
        Ok(step)
    }

    /// All reachable steps in declaration order, trigger first.
    pub fn steps(&self) -> Vec<&Step> {
        self.graph
            .traverse()
            .into_iter()
            .filter_map(|id| self.graph.get(id))
            .collect()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps().into_iter().map(|step| step.name.as_str()).collect()
    }

    pub fn validation_issues(&self) -> Vec<ValidationIssue> {
        validity::issues(&self.graph)
    }

    /// Same content under a new display name and graph, validity recomputed.
    pub(crate) fn with_content(&self, display_name: String, graph: StepGraph) -> Self {
        Self::from_parts(self.id, self.flow_id, display_name, self.state, graph)
    }

    pub(crate) fn locked(&self) -> Self {
        Self {
            state: VersionState::Locked,
            ..self.clone()
        }
    }

    /// A new editable draft carrying this version's content.
    pub(crate) fn fork(&self, id: VersionId) -> Self {
        Self::from_parts(
            id,
            self.flow_id,
            self.display_name.clone(),
            VersionState::Draft,
            self.graph.clone(),
        )
    }
}
