//! # Switchyard - Flow Versions, Branch Routing and Structured Edits
//!
//! **Switchyard** models automation flows as versioned step graphs. A flow owns
//! one editable draft and, once published, an immutable locked version. Every
//! change to a draft goes through a typed operation protocol that validates the
//! request before anything is touched, and routers pick which branches to run by
//! evaluating OR-of-AND condition groups against runtime data.
//!
//! ## Core Workflow
//!
//! 1.  **Create a flow**: `FlowEditor::builder(MemoryStore::new()).build()` gives a
//!     flow with a trigger-only draft.
//! 2.  **Edit**: apply `FlowOperation`s such as `ADD_ACTION` or `ADD_BRANCH`. A
//!     rejected operation leaves the draft exactly as it was.
//! 3.  **Publish**: `LOCK_AND_PUBLISH` locks a valid draft and opens a new one.
//! 4.  **Route**: `route` evaluates a router's branches against a `ValueResolver`
//!     and returns the selected branches with a trace of every condition.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchyard::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let mut editor = FlowEditor::builder(MemoryStore::new())
//!         .display_name("Orders")
//!         .build()?;
//!
//!     let router = RouterDraft {
//!         execution_type: ExecutionType::ExecuteFirstMatch,
//!         branches: vec![
//!             BranchDraft::condition(
//!                 "Large",
//!                 vec![vec![
//!                     BranchCondition::new("{{trigger.total}}", BranchOperator::NumberIsGreaterThan)
//!                         .with_second("100"),
//!                 ]],
//!             ),
//!             BranchDraft::fallback("Otherwise"),
//!         ],
//!     };
//!     editor.apply(&FlowOperation::AddAction(AddActionRequest {
//!         parent_step: "trigger".to_string(),
//!         step_location_relative_to_parent: StepLocation::After,
//!         branch_index: None,
//!         action: ActionDraft {
//!             name: Some("route_orders".to_string()),
//!             display_name: "Route orders".to_string(),
//!             settings: ActionSettingsDraft::Router(router),
//!         },
//!     }))?;
//!
//!     let draft = editor.draft();
//!     let settings = draft
//!         .get_step("route_orders")
//!         .and_then(|step| step.settings.as_router())
//!         .ok_or("router missing")?;
//!     let decision = route(settings, &ContextResolver::new(json!({ "trigger": { "total": 250 } })))?;
//!     for reason in decision.reasons() {
//!         println!("-> {}", reason);
//!     }
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod error;
pub mod operation;
pub mod prelude;
pub mod router;
pub mod step;
pub mod trace;
pub mod version;
