//! Property tests over random sequences of branch edits.
mod common;
use ahash::AHashSet;
use common::*;
use proptest::prelude::*;
use switchyard::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Add(usize),
    Delete(usize),
    Duplicate(usize),
    AddPath,
    DeletePath,
}

impl Edit {
    fn operation(&self, serial: usize) -> FlowOperation {
        let step_name = "router".to_string();
        match *self {
            Edit::Add(index) => FlowOperation::AddBranch(AddBranchRequest {
                step_name,
                branch_index: index,
                branch_name: format!("Added {}", serial),
            }),
            Edit::Delete(index) => FlowOperation::DeleteBranch(DeleteBranchRequest {
                step_name,
                branch_index: index,
            }),
            Edit::Duplicate(index) => FlowOperation::DuplicateBranch(DuplicateBranchRequest {
                step_name,
                branch_index: index,
            }),
            Edit::AddPath => FlowOperation::AddPath(AddPathRequest {
                step_name,
                branch_name: format!("Path {}", serial),
            }),
            Edit::DeletePath => FlowOperation::DeletePath(DeletePathRequest {
                step_name,
                branch_index: None,
            }),
        }
    }
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..6).prop_map(Edit::Add),
        (0usize..6).prop_map(Edit::Delete),
        (0usize..6).prop_map(Edit::Duplicate),
        Just(Edit::AddPath),
        Just(Edit::DeletePath),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn branch_edits_keep_the_router_well_formed(edits in prop::collection::vec(edit(), 0..30)) {
        let mut version = routed_editor().draft().as_ref().clone();

        for (serial, edit) in edits.iter().enumerate() {
            let before = to_json(&version);
            match version.apply(&edit.operation(serial)) {
                Ok(outcome) => version = outcome.version,
                Err(_) => prop_assert_eq!(to_json(&version), before),
            }

            let settings = router_of(&version, "router");
            prop_assert!(settings.branches.len() >= 2);
            prop_assert!(settings.branches.last().is_some_and(|branch| branch.is_fallback()));
            prop_assert_eq!(settings.branches.iter().filter(|branch| branch.is_fallback()).count(), 1);

            let names = version.step_names();
            let unique: AHashSet<&str> = names.iter().copied().collect();
            prop_assert_eq!(unique.len(), names.len());
            prop_assert_eq!(names.len(), version.graph().len());
        }
    }

    #[test]
    fn first_match_selects_at_most_one_branch(amount in -1000i64..1000) {
        let draft = routed_editor().draft();
        let settings = router_of(&draft, "router");
        let resolver = ContextResolver::new(serde_json::json!({ "trigger": { "amount": amount } }));

        let decision = route(&settings, &resolver).unwrap();

        prop_assert_eq!(decision.selected.len(), 1);
        let expected = if amount > 100 { 0 } else if amount > 10 { 1 } else { 2 };
        prop_assert_eq!(decision.selected[0], expected);
    }
}
