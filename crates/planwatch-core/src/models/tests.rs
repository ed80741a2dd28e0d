#[cfg(test)]
mod model_tests {
    use crate::models::{
        ActivePlanData, Amount, ChainId, PlanResponse, PlanStatus, PlanStep, PlanTransaction,
        StepMethod, StepProof, StepStatus, StepType,
    };

    fn create_test_step(step_index: u32, step_type: StepType, status: StepStatus) -> PlanStep {
        PlanStep {
            step_index,
            step_type,
            status,
            method: StepMethod::SendTx,
            chain_id: None,
            payload: serde_json::json!({"to": "0xrouter", "data": "0x"}),
            slippage: Some(0.5),
            token_in_amount: Some(Amount::new(1_000)),
            token_out_amount: None,
            proof: None,
        }
    }

    fn create_test_plan(statuses: &[StepStatus]) -> PlanResponse {
        PlanResponse {
            plan_id: "plan-123".to_string(),
            status: PlanStatus::Active,
            swapper: "0xABCDEF".to_string(),
            steps: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| create_test_step(i as u32, StepType::ClassicSwap, *status))
                .collect(),
            gas_fee: Some("21000".to_string()),
            expected_output: Amount::new(100_000_000),
            current_step_index: 0,
            time_estimate_ms: Some(12_000),
        }
    }

    #[test]
    fn test_step_status_ordering() {
        assert!(!StepStatus::AwaitingAction.regresses_to(StepStatus::Pending));
        assert!(!StepStatus::Pending.regresses_to(StepStatus::Complete));
        assert!(!StepStatus::Pending.regresses_to(StepStatus::Pending));
        assert!(StepStatus::Pending.regresses_to(StepStatus::AwaitingAction));
        assert!(StepStatus::Complete.regresses_to(StepStatus::Pending));
        assert!(StepStatus::Complete.regresses_to(StepStatus::Error));
        assert!(!StepStatus::Error.regresses_to(StepStatus::Error));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("AWAITING_ACTION".parse(), Ok(StepStatus::AwaitingAction));
        assert_eq!("canceled".parse(), Ok(PlanStatus::Cancelled));
        assert!("unknown".parse::<StepStatus>().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_plan() {
        let plan = create_test_plan(&[StepStatus::AwaitingAction, StepStatus::AwaitingAction]);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_steps() {
        let plan = create_test_plan(&[]);
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("steps"));
    }

    #[test]
    fn test_validate_rejects_unordered_steps() {
        let mut plan = create_test_plan(&[StepStatus::AwaitingAction, StepStatus::AwaitingAction]);
        plan.steps.swap(0, 1);
        assert!(plan.validate().is_err());

        let mut duplicate = create_test_plan(&[StepStatus::AwaitingAction, StepStatus::AwaitingAction]);
        duplicate.steps[1].step_index = 0;
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_current_step() {
        let mut plan = create_test_plan(&[StepStatus::AwaitingAction]);
        plan.current_step_index = 4;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_failed_plan() {
        let mut plan = create_test_plan(&[StepStatus::Error]);
        plan.status = PlanStatus::Failed;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_unknown_step_type_deserializes() {
        let step: PlanStep = serde_json::from_str(
            r#"{"stepIndex": 3, "stepType": "SOMETHING_NEW", "status": "PENDING", "method": "SIGN_TYPED_DATA"}"#,
        )
        .unwrap();
        assert_eq!(step.step_type, StepType::Unknown);
        assert_eq!(step.method, StepMethod::SignTypedData);
        assert!(step.payload.is_null());
    }

    #[test]
    fn test_active_plan_transforms_steps() {
        let mut plan = create_test_plan(&[StepStatus::AwaitingAction, StepStatus::AwaitingAction]);
        plan.steps.reverse();
        plan.steps[0].chain_id = Some(ChainId::BASE);

        let active = ActivePlanData::from_response(plan, ChainId::ETHEREUM);
        assert_eq!(active.steps[0].step_index, 0);
        assert_eq!(active.steps[0].chain_id, Some(ChainId::ETHEREUM));
        assert_eq!(active.steps[1].chain_id, Some(ChainId::BASE));
    }

    #[test]
    fn test_merge_keeps_forward_only_statuses() {
        let plan = create_test_plan(&[StepStatus::Complete, StepStatus::Pending]);
        let mut active = ActivePlanData::from_response(plan, ChainId::ETHEREUM);

        let stale = create_test_plan(&[StepStatus::Pending, StepStatus::AwaitingAction]);
        active.merge_response(stale);

        assert_eq!(active.steps[0].status, StepStatus::Complete);
        assert_eq!(active.steps[1].status, StepStatus::Pending);
    }

    #[test]
    fn test_merge_allows_regression_on_cancelled_plan() {
        let plan = create_test_plan(&[StepStatus::Pending]);
        let mut active = ActivePlanData::from_response(plan, ChainId::ETHEREUM);

        let mut cancelled = create_test_plan(&[StepStatus::AwaitingAction]);
        cancelled.status = PlanStatus::Cancelled;
        active.merge_response(cancelled);

        assert_eq!(active.steps[0].status, StepStatus::AwaitingAction);
        assert_eq!(active.response.status, PlanStatus::Cancelled);
    }

    #[test]
    fn test_proof_pending_clears_when_service_reflects_proof() {
        let plan = create_test_plan(&[StepStatus::AwaitingAction]);
        let mut active = ActivePlanData::from_response(plan, ChainId::ETHEREUM);

        active.record_proof(0, StepProof::tx("0xhash"));
        assert!(active.proof_pending);

        active.merge_response(create_test_plan(&[StepStatus::AwaitingAction]));
        assert!(active.proof_pending);
        assert_eq!(active.steps[0].tx_hash(), Some("0xhash"));

        let mut acknowledged = create_test_plan(&[StepStatus::Pending]);
        acknowledged.steps[0].proof = Some(StepProof::tx("0xhash"));
        active.merge_response(acknowledged);
        assert!(!active.proof_pending);
    }

    #[test]
    fn test_plan_transaction_from_response() {
        let mut plan = create_test_plan(&[StepStatus::Complete, StepStatus::Pending]);
        plan.steps[0].proof = Some(StepProof::tx("0xaaa"));

        let record = PlanTransaction::from_response("  0xABCDEF ", ChainId::ETHEREUM, &plan);
        assert_eq!(record.address, "0xabcdef");
        assert_eq!(record.tx_hashes, vec!["0xaaa".to_string()]);
        assert_eq!(record.completed_steps(), 1);
    }
}
