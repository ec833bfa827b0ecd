//! Routing: execution policies, traces and evaluation errors.
mod common;
use common::*;
use serde_json::json;
use switchyard::prelude::*;

#[cfg(test)]
mod router_tests {
    use super::*;

    fn settings(execution_type: ExecutionType, branches: Vec<Branch>) -> RouterSettings {
        RouterSettings {
            execution_type,
            branches,
        }
    }

    fn when(name: &str, condition: BranchCondition) -> Branch {
        Branch {
            conditions: vec![vec![condition]],
            ..Branch::condition(name)
        }
    }

    fn context(amount: serde_json::Value) -> ContextResolver {
        ContextResolver::new(json!({ "trigger": { "amount": amount, "country": "DE", "tags": ["vip", "repeat"] } }))
    }

    #[test]
    fn test_first_match_selects_only_the_true_branch() {
        let router = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![
                when("Huge", amount_above("1000")),
                when("Medium", amount_above("10")),
                Branch::fallback("Otherwise"),
            ],
        );

        let decision = route(&router, &context(json!(50))).expect("routing should succeed");

        assert_eq!(decision.selected, vec![1]);
        assert!(!decision.fallback_taken());
        assert!(!decision.branches[0].eligible);
        assert!(decision.branches[1].eligible);
    }

    #[test]
    fn test_first_match_runs_only_the_first_of_several_matches() {
        let router = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![
                when("Big", amount_above("100")),
                when("Medium", amount_above("10")),
                Branch::fallback("Otherwise"),
            ],
        );
        let decision = route(&router, &context(json!(500))).unwrap();
        assert_eq!(decision.selected, vec![0]);
    }

    #[test]
    fn test_all_match_runs_every_true_branch_in_order() {
        let router = settings(
            ExecutionType::ExecuteAllMatch,
            vec![
                when("Over 1", amount_above("1")),
                when(
                    "From Germany",
                    BranchCondition::new("{{trigger.country}}", BranchOperator::TextExactlyMatches)
                        .with_second("de"),
                ),
                when(
                    "VIP",
                    BranchCondition::new("{{trigger.tags}}", BranchOperator::ListContains)
                        .with_second("VIP"),
                ),
                Branch::fallback("Otherwise"),
            ],
        );

        let decision = route(&router, &context(json!(5))).unwrap();

        assert_eq!(decision.selected, vec![0, 1, 2]);
        assert!(!decision.fallback_taken());
    }

    #[test]
    fn test_all_false_selects_exactly_the_fallback_under_both_policies() {
        for execution_type in [ExecutionType::ExecuteFirstMatch, ExecutionType::ExecuteAllMatch] {
            let router = settings(
                execution_type,
                vec![
                    when("Big", amount_above("100")),
                    when("Medium", amount_above("10")),
                    Branch::fallback("Otherwise"),
                ],
            );
            let decision = route(&router, &context(json!(3))).unwrap();
            assert_eq!(decision.selected, vec![2], "{:?}", execution_type);
            assert!(decision.fallback_taken());
        }
    }

    #[test]
    fn test_branch_without_conditions_never_matches() {
        let router = settings(
            ExecutionType::ExecuteAllMatch,
            vec![Branch::condition("Unauthored"), Branch::fallback("Otherwise")],
        );
        let decision = route(&router, &LiteralResolver).unwrap();
        assert_eq!(decision.selected, vec![1]);
    }

    #[test]
    fn test_non_numeric_operand_is_an_evaluation_error() {
        let router = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![when("Big", amount_above("100")), Branch::fallback("Otherwise")],
        );

        let result = route(&router, &context(json!("a lot")));

        assert!(matches!(
            result,
            Err(EvaluationError::NotANumber {
                operator: BranchOperator::NumberIsGreaterThan,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_operand_is_structural_when_written_and_an_evaluation_error_when_routed() {
        let incomplete = BranchCondition::new("{{trigger.country}}", BranchOperator::TextExactlyMatches);
        let hand_built = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![when("Germany", incomplete.clone()), Branch::fallback("Otherwise")],
        );

        assert!(matches!(
            route(&hand_built, &context(json!(1))),
            Err(EvaluationError::MissingOperand { operand: "secondValue", .. })
        ));

        let written = router(
            "router",
            ExecutionType::ExecuteFirstMatch,
            vec![
                BranchDraft::condition("Germany", vec![vec![incomplete]]),
                BranchDraft::fallback("Otherwise"),
            ],
        );
        assert!(matches!(
            new_editor().draft().apply(&add_after("trigger", written)),
            Err(FlowError::Structural(StructuralError::MissingOperand { .. }))
        ));
    }

    #[test]
    fn test_or_groups_short_circuit_and_traces_record_it() {
        let branch = Branch {
            conditions: vec![
                vec![amount_above("1000"), amount_above("not even a number")],
                vec![amount_above("10")],
                vec![amount_above("also not a number")],
            ],
            ..Branch::condition("Mixed")
        };
        let router = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![branch, Branch::fallback("Otherwise")],
        );

        let decision = route(&router, &context(json!(50))).unwrap();
        let trace = &decision.branches[0];

        assert_eq!(decision.selected, vec![0]);
        // The third group is never reached.
        assert_eq!(trace.groups.len(), 2);
        assert_eq!(trace.groups[0].conditions[1], ConditionTrace::NotEvaluated);
        assert!(trace.groups[1].outcome);
    }

    #[test]
    fn test_reasons_show_resolved_values() {
        let router = settings(
            ExecutionType::ExecuteFirstMatch,
            vec![when("Big", amount_above("100")), Branch::fallback("Otherwise")],
        );

        let taken = route(&router, &context(json!(250))).unwrap();
        assert_eq!(taken.reasons(), vec!["Big: {{trigger.amount}} (was 250) > 100"]);

        let fallback = route(&router, &context(json!(5))).unwrap();
        assert_eq!(fallback.reasons(), vec!["Otherwise: otherwise"]);
    }

    #[test]
    fn test_routing_a_router_from_a_flow_version() {
        let draft = routed_editor().draft();
        let settings = router_of(&draft, "router");

        let decision = route(&settings, &context(json!(42))).unwrap();

        assert_eq!(decision.selected, vec![1]);
        let child = settings.branches[1].child.expect("Medium has a child");
        assert_eq!(draft.graph().get(child).map(|s| s.name.as_str()), Some("medium_order"));
    }

    #[test]
    fn test_policy_is_pure_over_eligibility() {
        let branches = vec![
            Branch::condition("A"),
            Branch::condition("B"),
            Branch::condition("C"),
            Branch::fallback("Otherwise"),
        ];
        let eligibility = [true, false, true, false];

        assert_eq!(
            select_branches(ExecutionType::ExecuteFirstMatch, &branches, &eligibility),
            vec![0]
        );
        assert_eq!(
            select_branches(ExecutionType::ExecuteAllMatch, &branches, &eligibility),
            vec![0, 2]
        );
        assert_eq!(
            select_branches(ExecutionType::ExecuteAllMatch, &branches, &[false; 4]),
            vec![3]
        );
    }
}
