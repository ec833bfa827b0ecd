//! Action editing: add, update, delete, duplicate and move.
mod common;
use common::*;
use serde_json::Map;
use switchyard::prelude::*;

#[cfg(test)]
mod action_tests {
    use super::*;

    fn names(version: &FlowVersion) -> Vec<String> {
        version.step_names().iter().map(|name| name.to_string()).collect()
    }

    fn loop_over(name: &str, items: &str) -> ActionDraft {
        ActionDraft {
            name: Some(name.to_string()),
            display_name: name.to_string(),
            settings: ActionSettingsDraft::LoopOnItems(LoopDraft {
                items: items.to_string(),
            }),
        }
    }

    fn update(name: &str, settings: ActionSettingsDraft) -> FlowOperation {
        FlowOperation::UpdateAction(UpdateActionRequest {
            name: name.to_string(),
            display_name: format!("{} (edited)", name),
            settings,
        })
    }

    fn delete(names: &[&str]) -> FlowOperation {
        FlowOperation::DeleteAction(DeleteActionRequest {
            names: names.iter().map(|name| name.to_string()).collect(),
        })
    }

    fn move_to(name: &str, parent: &str, location: StepLocation, index: Option<usize>) -> FlowOperation {
        FlowOperation::MoveAction(MoveActionRequest {
            name: name.to_string(),
            new_parent_step: parent.to_string(),
            step_location_relative_to_parent: location,
            branch_index: index,
        })
    }

    fn next_of(version: &FlowVersion, name: &str) -> Option<String> {
        let step = version.get_step(name)?;
        let next = version.graph().get(step.next_action?)?;
        Some(next.name.clone())
    }

    #[test]
    fn test_traversal_is_depth_first_in_declaration_order() {
        let draft = routed_editor().draft();
        assert_eq!(
            names(&draft),
            vec!["trigger", "router", "large_order", "medium_order", "small_order", "notify"]
        );
    }

    #[test]
    fn test_add_action_mints_a_name_when_none_is_given() {
        let draft = routed_editor().draft();
        let unnamed = ActionDraft {
            name: None,
            ..code("ignored")
        };

        let version = draft.apply(&add_after("notify", unnamed)).unwrap().version;

        assert_eq!(next_of(&version, "notify").as_deref(), Some("step_1"));
    }

    #[test]
    fn test_add_action_rejects_a_taken_name() {
        let draft = routed_editor().draft();
        let result = draft.apply(&add_after("trigger", code("notify")));
        assert!(matches!(
            result,
            Err(FlowError::Structural(StructuralError::DuplicateStepName { .. }))
        ));
    }

    #[test]
    fn test_add_action_after_becomes_the_new_successor() {
        let draft = routed_editor().draft();
        let version = draft.apply(&add_after("trigger", code("enrich"))).unwrap().version;
        assert_eq!(next_of(&version, "trigger").as_deref(), Some("enrich"));
        assert_eq!(next_of(&version, "enrich").as_deref(), Some("router"));
    }

    #[test]
    fn test_add_inside_branch_needs_a_branch_index() {
        let draft = routed_editor().draft();
        let operation = FlowOperation::AddAction(AddActionRequest {
            parent_step: "router".to_string(),
            step_location_relative_to_parent: StepLocation::InsideBranch,
            branch_index: None,
            action: code("orphan"),
        });
        assert!(matches!(
            draft.apply(&operation),
            Err(FlowError::Structural(StructuralError::MissingBranchIndex { .. }))
        ));
    }

    #[test]
    fn test_add_inside_loop_needs_a_loop() {
        let draft = routed_editor().draft();
        let operation = FlowOperation::AddAction(AddActionRequest {
            parent_step: "notify".to_string(),
            step_location_relative_to_parent: StepLocation::InsideLoop,
            branch_index: None,
            action: code("orphan"),
        });
        assert!(matches!(
            draft.apply(&operation),
            Err(FlowError::Structural(StructuralError::NotALoop { .. }))
        ));
    }

    #[test]
    fn test_loop_body_survives_settings_update() {
        let mut editor = new_editor();
        editor.apply(&configure_trigger()).unwrap();
        editor
            .apply(&add_after("trigger", loop_over("each_line", "{{trigger.lines}}")))
            .unwrap();
        editor
            .apply(&FlowOperation::AddAction(AddActionRequest {
                parent_step: "each_line".to_string(),
                step_location_relative_to_parent: StepLocation::InsideLoop,
                branch_index: None,
                action: code("reserve_stock"),
            }))
            .unwrap();
        assert_eq!(names(&editor.draft()), vec!["trigger", "each_line", "reserve_stock"]);

        let version = editor
            .apply(&update(
                "each_line",
                ActionSettingsDraft::LoopOnItems(LoopDraft {
                    items: "{{trigger.items}}".to_string(),
                }),
            ))
            .unwrap();

        assert_eq!(names(&version), vec!["trigger", "each_line", "reserve_stock"]);
        assert_eq!(version.get_step("each_line").unwrap().display_name, "each_line (edited)");
        assert!(version.is_valid());
    }

    #[test]
    fn test_router_update_keeps_children_by_position() {
        let draft = routed_editor().draft();
        let settings = ActionSettingsDraft::Router(RouterDraft {
            execution_type: ExecutionType::ExecuteAllMatch,
            branches: vec![
                BranchDraft::condition("Over 500", vec![vec![amount_above("500")]]),
                BranchDraft::condition("Over 50", vec![vec![amount_above("50")]]),
                BranchDraft::fallback("Rest"),
            ],
        });

        let version = draft.apply(&update("router", settings)).unwrap().version;

        assert_eq!(branch_names(&version, "router"), vec!["Over 500", "Over 50", "Rest"]);
        assert_eq!(branch_chain(&version, "router", 0), vec!["large_order"]);
        assert_eq!(branch_chain(&version, "router", 2), vec!["small_order"]);
        assert_eq!(
            router_of(&version, "router").execution_type,
            ExecutionType::ExecuteAllMatch
        );
    }

    #[test]
    fn test_router_update_must_keep_branch_count() {
        let draft = routed_editor().draft();
        let settings = ActionSettingsDraft::Router(RouterDraft::default());
        let result = draft.apply(&update("router", settings));
        assert!(matches!(
            result,
            Err(FlowError::Invariant(InvariantViolation::BranchCountMismatch {
                current: 3,
                provided: 2,
                ..
            }))
        ));
    }

    #[test]
    fn test_kind_change_discards_children() {
        let draft = routed_editor().draft();
        let settings = ActionSettingsDraft::Code(CodeSettings {
            source_code: "return 1;".to_string(),
            input: Map::new(),
        });

        let outcome = draft.apply(&update("router", settings)).unwrap();

        assert_eq!(
            outcome.removed_steps,
            vec!["large_order", "medium_order", "small_order"]
        );
        assert_eq!(names(&outcome.version), vec!["trigger", "router", "notify"]);
        assert!(outcome.version.is_valid());
    }

    #[test]
    fn test_update_action_rejects_the_trigger() {
        let draft = routed_editor().draft();
        let settings = ActionSettingsDraft::Code(CodeSettings::default());
        assert!(matches!(
            draft.apply(&update("trigger", settings)),
            Err(FlowError::Structural(StructuralError::TriggerNotAllowed { .. }))
        ));
    }

    #[test]
    fn test_delete_action_splices_the_chain() {
        let draft = routed_editor().draft();

        let outcome = draft.apply(&delete(&["router"])).unwrap();

        assert_eq!(
            outcome.removed_steps,
            vec!["router", "large_order", "medium_order", "small_order"]
        );
        assert_eq!(next_of(&outcome.version, "trigger").as_deref(), Some("notify"));
        assert_eq!(outcome.version.graph().len(), 2);
    }

    #[test]
    fn test_delete_action_skips_steps_already_removed() {
        let draft = routed_editor().draft();
        let outcome = draft.apply(&delete(&["router", "large_order", "notify"])).unwrap();
        assert_eq!(names(&outcome.version), vec!["trigger"]);
    }

    #[test]
    fn test_trigger_cannot_be_deleted_or_moved() {
        let draft = routed_editor().draft();
        for operation in [
            delete(&["trigger"]),
            move_to("trigger", "notify", StepLocation::After, None),
            FlowOperation::DuplicateAction(DuplicateActionRequest {
                step_name: "trigger".to_string(),
            }),
        ] {
            assert!(
                matches!(
                    draft.apply(&operation),
                    Err(FlowError::Invariant(InvariantViolation::TriggerImmovable { .. }))
                ),
                "{}",
                operation.kind()
            );
        }
    }

    #[test]
    fn test_duplicate_action_copies_the_whole_subtree() {
        let draft = routed_editor().draft();
        let before = draft.graph().names();

        let version = draft
            .apply(&FlowOperation::DuplicateAction(DuplicateActionRequest {
                step_name: "router".to_string(),
            }))
            .unwrap()
            .version;

        let copy = next_of(&version, "router").expect("copy follows the source");
        assert!(!before.contains(&copy));
        assert_eq!(next_of(&version, &copy).as_deref(), Some("notify"));
        assert_eq!(branch_names(&version, &copy), vec!["Large", "Medium", "Otherwise"]);
        for index in 0..3 {
            let chain = branch_chain(&version, &copy, index);
            assert_eq!(chain.len(), 1);
            assert!(!before.contains(&chain[0]));
        }
        assert_eq!(version.steps().len(), 10);
        assert!(version.is_valid());
    }

    #[test]
    fn test_move_action_into_a_branch() {
        let draft = routed_editor().draft();

        let version = draft
            .apply(&move_to("notify", "router", StepLocation::InsideBranch, Some(0)))
            .unwrap()
            .version;

        assert_eq!(branch_chain(&version, "router", 0), vec!["notify", "large_order"]);
        assert_eq!(next_of(&version, "router"), None);
        assert_eq!(version.steps().len(), 6);
    }

    #[test]
    fn test_move_action_into_own_subtree_is_rejected() {
        let draft = routed_editor().draft();
        for operation in [
            move_to("router", "large_order", StepLocation::After, None),
            move_to("router", "router", StepLocation::InsideBranch, Some(1)),
            move_to("notify", "notify", StepLocation::After, None),
        ] {
            assert!(matches!(
                draft.apply(&operation),
                Err(FlowError::Invariant(InvariantViolation::MoveIntoOwnSubtree { .. }))
            ));
        }
    }

    #[test]
    fn test_get_action_or_err() {
        let draft = routed_editor().draft();
        assert_eq!(draft.get_action_or_err("notify").unwrap().name, "notify");
        assert!(matches!(
            draft.get_action_or_err("trigger"),
            Err(StructuralError::TriggerNotAllowed { .. })
        ));
        assert!(matches!(
            draft.get_action_or_err("nope"),
            Err(StructuralError::StepNotFound { .. })
        ));
    }

    #[test]
    fn test_incomplete_settings_are_reported() {
        let draft = new_editor().draft();
        let incomplete = ActionDraft {
            name: Some("send".to_string()),
            display_name: "Send".to_string(),
            settings: ActionSettingsDraft::Piece(PieceSettings {
                piece_name: "@pieces/mail".to_string(),
                piece_version: "0.3.0".to_string(),
                action_name: None,
                input: Map::new(),
            }),
        };

        let version = draft.apply(&add_after("trigger", incomplete)).unwrap().version;
        let issues: Vec<String> = version
            .validation_issues()
            .iter()
            .map(|issue| issue.to_string())
            .collect();

        assert!(!version.is_valid());
        assert!(issues.contains(&"trigger: trigger is not configured".to_string()));
        assert!(issues.contains(&"send: actionName is required".to_string()));
    }
}
