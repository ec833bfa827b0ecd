use crate::router::RouterSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena key of a step inside a `StepGraph`. Only meaningful within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub u32);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a connector action and the inputs mapped onto it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSettings {
    pub piece_name: String,
    pub piece_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default)]
    pub input: serde_json::Map<String, serde_json::Value>,
}

/// Reference to a connector trigger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceTriggerSettings {
    pub piece_name: String,
    pub piece_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_name: Option<String>,
    #[serde(default)]
    pub input: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSettings {
    pub source_code: String,
    #[serde(default)]
    pub input: serde_json::Map<String, serde_json::Value>,
}

/// Iterates its body chain once per item of the `items` expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSettings {
    pub items: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_loop_action: Option<StepId>,
}

/// Variant-specific settings of a step. The first two variants are triggers,
/// the rest are actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepSettings {
    Empty,
    PieceTrigger(PieceTriggerSettings),
    Piece(PieceSettings),
    Code(CodeSettings),
    LoopOnItems(LoopSettings),
    Router(RouterSettings),
}

impl StepSettings {
    pub fn is_trigger(&self) -> bool {
        matches!(self, StepSettings::Empty | StepSettings::PieceTrigger(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StepSettings::Empty => "EMPTY",
            StepSettings::PieceTrigger(_) => "PIECE_TRIGGER",
            StepSettings::Piece(_) => "PIECE",
            StepSettings::Code(_) => "CODE",
            StepSettings::LoopOnItems(_) => "LOOP_ON_ITEMS",
            StepSettings::Router(_) => "ROUTER",
        }
    }

    /// Heads of the child chains owned by this step, in declaration order.
    /// Empty slots are skipped.
    pub fn children(&self) -> Vec<StepId> {
        match self {
            StepSettings::LoopOnItems(settings) => settings.first_loop_action.into_iter().collect(),
            StepSettings::Router(settings) => settings
                .branches
                .iter()
                .filter_map(|branch| branch.child)
                .collect(),
            StepSettings::Empty
            | StepSettings::PieceTrigger(_)
            | StepSettings::Piece(_)
            | StepSettings::Code(_) => Vec::new(),
        }
    }

    /// Mutable access to every child slot, including empty ones.
    pub(crate) fn child_slots_mut(&mut self) -> Vec<&mut Option<StepId>> {
        match self {
            StepSettings::LoopOnItems(settings) => vec![&mut settings.first_loop_action],
            StepSettings::Router(settings) => settings
                .branches
                .iter_mut()
                .map(|branch| &mut branch.child)
                .collect(),
            StepSettings::Empty
            | StepSettings::PieceTrigger(_)
            | StepSettings::Piece(_)
            | StepSettings::Code(_) => Vec::new(),
        }
    }

    pub fn as_router(&self) -> Option<&RouterSettings> {
        match self {
            StepSettings::Router(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn as_router_mut(&mut self) -> Option<&mut RouterSettings> {
        match self {
            StepSettings::Router(settings) => Some(settings),
            _ => None,
        }
    }
}

/// A node of the step graph.
///
/// `next_action` is owned exclusively by this step: no two steps may point at
/// the same successor, and child chains are owned by exactly one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<StepId>,
    pub settings: StepSettings,
}

impl Step {
    pub fn is_trigger(&self) -> bool {
        self.settings.is_trigger()
    }

    pub fn is_router(&self) -> bool {
        matches!(self.settings, StepSettings::Router(_))
    }
}
