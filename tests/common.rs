//! Common test utilities for building flows and operations.
use serde_json::Map;
use switchyard::prelude::*;

/// A fresh flow with a trigger-only draft.
#[allow(dead_code)]
pub fn new_editor() -> FlowEditor<MemoryStore> {
    FlowEditor::builder(MemoryStore::new())
        .display_name("Order routing")
        .build()
        .expect("Failed to build editor")
}

#[allow(dead_code)]
pub fn configure_trigger() -> FlowOperation {
    FlowOperation::UpdateTrigger(UpdateTriggerRequest {
        display_name: "New order".to_string(),
        settings: TriggerDraft::PieceTrigger(PieceTriggerSettings {
            piece_name: "@pieces/shop".to_string(),
            piece_version: "1.0.0".to_string(),
            trigger_name: Some("new_order".to_string()),
            input: Map::new(),
        }),
    })
}

/// A complete code action with the given step name.
#[allow(dead_code)]
pub fn code(name: &str) -> ActionDraft {
    ActionDraft {
        name: Some(name.to_string()),
        display_name: name.to_string(),
        settings: ActionSettingsDraft::Code(CodeSettings {
            source_code: "export const code = async (inputs) => inputs;".to_string(),
            input: Map::new(),
        }),
    }
}

#[allow(dead_code)]
pub fn router(name: &str, execution_type: ExecutionType, branches: Vec<BranchDraft>) -> ActionDraft {
    ActionDraft {
        name: Some(name.to_string()),
        display_name: name.to_string(),
        settings: ActionSettingsDraft::Router(RouterDraft {
            execution_type,
            branches,
        }),
    }
}

#[allow(dead_code)]
pub fn add_after(parent: &str, action: ActionDraft) -> FlowOperation {
    FlowOperation::AddAction(AddActionRequest {
        parent_step: parent.to_string(),
        step_location_relative_to_parent: StepLocation::After,
        branch_index: None,
        action,
    })
}

#[allow(dead_code)]
pub fn add_in_branch(router: &str, index: usize, action: ActionDraft) -> FlowOperation {
    FlowOperation::AddAction(AddActionRequest {
        parent_step: router.to_string(),
        step_location_relative_to_parent: StepLocation::InsideBranch,
        branch_index: Some(index),
        action,
    })
}

/// `{{trigger.amount}} > threshold`
#[allow(dead_code)]
pub fn amount_above(threshold: &str) -> BranchCondition {
    BranchCondition::new("{{trigger.amount}}", BranchOperator::NumberIsGreaterThan)
        .with_second(threshold)
}

/// Branches `Large` (> 100) and `Medium` (> 10) followed by the fallback.
#[allow(dead_code)]
pub fn order_branches() -> Vec<BranchDraft> {
    vec![
        BranchDraft::condition("Large", vec![vec![amount_above("100")]]),
        BranchDraft::condition("Medium", vec![vec![amount_above("10")]]),
        BranchDraft::fallback("Otherwise"),
    ]
}

/// A valid flow:
///
/// `trigger -> router [Large -> large_order, Medium -> medium_order, Otherwise -> small_order] -> notify`
#[allow(dead_code)]
pub fn routed_editor() -> FlowEditor<MemoryStore> {
    let mut editor = new_editor();
    let operations = vec![
        configure_trigger(),
        add_after(
            "trigger",
            router("router", ExecutionType::ExecuteFirstMatch, order_branches()),
        ),
        add_in_branch("router", 0, code("large_order")),
        add_in_branch("router", 1, code("medium_order")),
        add_in_branch("router", 2, code("small_order")),
        add_after("router", code("notify")),
    ];
    for operation in &operations {
        editor
            .apply(operation)
            .unwrap_or_else(|e| panic!("Failed to apply {}: {}", operation.kind(), e));
    }
    editor
}

#[allow(dead_code)]
pub fn router_of(version: &FlowVersion, name: &str) -> RouterSettings {
    version
        .get_step(name)
        .and_then(|step| step.settings.as_router())
        .cloned()
        .unwrap_or_else(|| panic!("'{}' is not a router", name))
}

#[allow(dead_code)]
pub fn branch_names(version: &FlowVersion, name: &str) -> Vec<String> {
    router_of(version, name)
        .branches
        .into_iter()
        .map(|branch| branch.branch_name)
        .collect()
}

/// Names of the steps in a branch's child chain, in order.
#[allow(dead_code)]
pub fn branch_chain(version: &FlowVersion, router: &str, index: usize) -> Vec<String> {
    let settings = router_of(version, router);
    let head = settings.branches.get(index).and_then(|branch| branch.child);
    version
        .graph()
        .chain(head)
        .into_iter()
        .filter_map(|id| version.graph().get(id))
        .map(|step| step.name.clone())
        .collect()
}

#[allow(dead_code)]
pub fn to_json(version: &FlowVersion) -> String {
    serde_json::to_string(version).expect("Failed to serialize version")
}
