use crate::condition::BranchOperator;
use crate::version::VersionId;
use thiserror::Error;

/// Errors raised when an operation references something that does not exist
/// or carries a malformed payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Step '{name}' was not found in the flow version")]
    StepNotFound { name: String },

    #[error("Step '{name}' is not a loop")]
    NotALoop { name: String },

    #[error("Step '{name}' is a trigger and cannot be used as an action")]
    TriggerNotAllowed { name: String },

    #[error("Branch index {index} is out of range for router '{step_name}' with {len} branches")]
    BranchIndexOutOfRange {
        step_name: String,
        index: usize,
        len: usize,
    },

    #[error(
        "Condition in branch '{branch_name}' of router '{step_name}' uses '{operator}' but has no {operand}"
    )]
    MissingOperand {
        step_name: String,
        branch_name: String,
        operator: BranchOperator,
        operand: &'static str,
    },

    #[error("Placing a step inside router '{step_name}' requires a branch index")]
    MissingBranchIndex { step_name: String },

    #[error("A step named '{name}' already exists in the flow version")]
    DuplicateStepName { name: String },

    #[error("Router '{step_name}' is malformed: {reason}")]
    MalformedRouter { step_name: String, reason: String },

    #[error("Flow version {id} was not found")]
    VersionNotFound { id: VersionId },

    /// Raised when a loaded step graph does not hold together, e.g. a stale
    /// id counter or a step linked from two places.
    #[error("Step graph is inconsistent: {reason}")]
    InconsistentGraph { reason: String },
}

/// Errors raised when an operation would break a structural invariant of the
/// flow or of its version lifecycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Router '{step_name}' must keep at least two branches")]
    TooFewBranches { step_name: String },

    #[error("The fallback branch of router '{step_name}' cannot be {action}")]
    FallbackBranch {
        step_name: String,
        action: &'static str,
    },

    #[error("Branch {index} of router '{step_name}' is not adjacent to the fallback branch")]
    NotTailAdjacent { step_name: String, index: usize },

    #[error(
        "Router '{step_name}' has {current} branches but the update provides {provided}; use branch operations to change the count"
    )]
    BranchCountMismatch {
        step_name: String,
        current: usize,
        provided: usize,
    },

    #[error("Flow version {id} is locked and cannot be modified")]
    VersionLocked { id: VersionId },

    #[error("Flow version {id} is not locked")]
    VersionNotLocked { id: VersionId },

    #[error("Flow version {id} is not the current draft of the flow")]
    NotCurrentDraft { id: VersionId },

    #[error("The flow has no published version")]
    NothingPublished,

    #[error("Flow version {id} is invalid and cannot be published: {reason}")]
    InvalidVersion { id: VersionId, reason: String },

    #[error("The trigger step '{name}' cannot be deleted, duplicated or moved")]
    TriggerImmovable { name: String },

    #[error("Step '{name}' cannot be moved into its own subtree")]
    MoveIntoOwnSubtree { name: String },

    #[error("Operation '{operation}' must be applied through the flow, not a single version")]
    FlowLevelOperation { operation: &'static str },
}

/// Errors raised while evaluating branch conditions at run time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Operator '{operator}' expected a number, but found value '{found}'")]
    NotANumber {
        operator: BranchOperator,
        found: serde_json::Value,
    },

    #[error("Operator '{operator}' expected a list, but found value '{found}'")]
    NotAList {
        operator: BranchOperator,
        found: serde_json::Value,
    },

    /// Routers written through operations never get here: they are rejected
    /// with `StructuralError::MissingOperand`, and loaded ones are reported by
    /// validation. Only settings built by hand reach routing this way.
    #[error("Operator '{operator}' requires a {operand}, but none was provided")]
    MissingOperand {
        operator: BranchOperator,
        operand: &'static str,
    },
}

/// Errors raised by a version store or while reading and writing snapshots.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Flow version {0} is locked and cannot be replaced")]
    LockedOverwrite(VersionId),

    #[error("Snapshot I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Umbrella error returned by the operation protocol and the version lifecycle.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Store(#[from] StoreError),
}
