use crate::router::RouterSettings;
use crate::step::{Step, StepGraph, StepSettings};
use crate::version::ValidationIssue;

/// Recomputes every step's `valid` flag and returns whether all are valid.
/// Steps left unreachable from the trigger make the whole version invalid.
pub(crate) fn recompute(graph: &mut StepGraph) -> bool {
    let ids = graph.traverse();
    let mut all_valid = ids.len() == graph.len();
    for id in ids {
        let Some(step) = graph.get(id) else {
            continue;
        };
        let valid = step_issues(step, id == graph.trigger_id()).is_empty();
        all_valid &= valid;
        if let Some(step) = graph.get_mut(id) {
            step.valid = valid;
        }
    }
    all_valid
}

pub(crate) fn issues(graph: &StepGraph) -> Vec<ValidationIssue> {
    let ids = graph.traverse();
    let mut out: Vec<ValidationIssue> = ids
        .iter()
        .filter_map(|id| graph.get(*id))
        .flat_map(|step| {
            step_issues(step, step.id == graph.trigger_id())
                .into_iter()
                .map(|message| ValidationIssue {
                    step_name: step.name.clone(),
                    message,
                })
        })
        .collect();
    if ids.len() != graph.len() {
        out.push(ValidationIssue {
            step_name: graph.trigger().name.clone(),
            message: format!(
                "{} step(s) are not reachable from the trigger",
                graph.len() - ids.len()
            ),
        });
    }
    out
}

fn step_issues(step: &Step, is_root: bool) -> Vec<String> {
    let mut out = Vec::new();
    if is_root != step.is_trigger() {
        out.push(if is_root {
            format!("the root step must be a trigger, found {}", step.settings.type_name())
        } else {
            format!("{} may only be used as the trigger", step.settings.type_name())
        });
    }

    match &step.settings {
        StepSettings::Empty => out.push("trigger is not configured".to_string()),
        StepSettings::PieceTrigger(settings) => {
            require(&mut out, "pieceName", &settings.piece_name);
            require(&mut out, "pieceVersion", &settings.piece_version);
            require_opt(&mut out, "triggerName", settings.trigger_name.as_deref());
        }
        StepSettings::Piece(settings) => {
            require(&mut out, "pieceName", &settings.piece_name);
            require(&mut out, "pieceVersion", &settings.piece_version);
            require_opt(&mut out, "actionName", settings.action_name.as_deref());
        }
        StepSettings::Code(settings) => require(&mut out, "sourceCode", &settings.source_code),
        StepSettings::LoopOnItems(settings) => require(&mut out, "items", &settings.items),
        StepSettings::Router(router) => router_issues(&mut out, &step.name, router),
    }
    out
}

fn router_issues(out: &mut Vec<String>, step_name: &str, router: &RouterSettings) {
    if let Err(err) = router.check_structure(step_name) {
        out.push(err.to_string());
    }
    if let Err(err) = router.check_operands(step_name) {
        out.push(err.to_string());
    }
    for branch in router.branches.iter().filter(|b| !b.is_fallback()) {
        if branch.conditions.is_empty() {
            out.push(format!("branch '{}' has no conditions", branch.branch_name));
        }
        if branch.conditions.iter().any(|group| group.is_empty()) {
            out.push(format!(
                "branch '{}' has an empty condition group",
                branch.branch_name
            ));
        }
        if branch
            .conditions
            .iter()
            .flatten()
            .any(|condition| condition.first_value.trim().is_empty())
        {
            out.push(format!(
                "branch '{}' has a condition without a first value",
                branch.branch_name
            ));
        }
    }
}

fn require(out: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        out.push(format!("{} is required", field));
    }
}

fn require_opt(out: &mut Vec<String>, field: &str, value: Option<&str>) {
    require(out, field, value.unwrap_or_default());
}
