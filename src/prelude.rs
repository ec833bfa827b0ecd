//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to build, edit, publish and route flows.
//!
//! # Example
//!
//! ```rust,no_run
//! use switchyard::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let snapshot = FlowSnapshot::from_file("path/to/flow.json")?;
//! let editor = FlowEditor::from_snapshot(snapshot)?;
//! for issue in editor.draft().validation_issues() {
//!     println!("{}", issue);
//! }
//! # Ok(())
//! # }
//! ```

// Versions and lifecycle
pub use crate::version::{
    Flow, FlowEditor, FlowEditorBuilder, FlowId, FlowSnapshot, FlowVersion, MemoryStore,
    OperationEvent, ValidationIssue, VersionId, VersionState, VersionStore,
};

// Operations
pub use crate::operation::{
    ActionDraft, ActionSettingsDraft, AddActionRequest, AddBranchRequest, AddPathRequest,
    BranchDraft, ChangeNameRequest, DeleteActionRequest, DeleteBranchRequest, DeletePathRequest,
    DuplicateActionRequest, DuplicateBranchRequest, FlowOperation, LockAndPublishRequest,
    LoopDraft, MoveActionRequest, OperationOutcome, RouterDraft, StepLocation, TriggerDraft,
    UpdateActionRequest, UpdateTriggerRequest, UseAsDraftRequest,
};

// Steps
pub use crate::step::{
    CodeSettings, LoopSettings, PieceSettings, PieceTriggerSettings, SequentialNamer, Step,
    StepGraph, StepId, StepNamer, StepSettings,
};

// Routing and conditions
pub use crate::condition::{
    BranchCondition, BranchOperator, ConditionEvaluator, ConditionGroup, ContextResolver,
    LiteralResolver, ValueResolver,
};
pub use crate::router::{
    Branch, BranchType, ExecutionType, RouteDecision, RouterSettings, route, select_branches,
};

// Traces
pub use crate::trace::{BranchTrace, ConditionTrace, GroupTrace, TraceFormatter};

// Error types
pub use crate::error::{EvaluationError, FlowError, InvariantViolation, StoreError, StructuralError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
