//! Plan model definition and related functionality.

use serde::{Deserialize, Serialize};

use super::{Amount, ChainId, PlanStatus, PlanStep, StepProof};
use crate::error::{PlanError, Result};

/// Server-tracked multi-step transaction intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    /// Opaque plan key assigned by the planning service
    pub plan_id: String,

    #[serde(default)]
    pub status: PlanStatus,

    /// Address executing the plan
    pub swapper: String,

    /// Steps ordered by `step_index`
    #[serde(default)]
    pub steps: Vec<PlanStep>,

    /// Gas fee estimate in the input chain's native unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_fee: Option<String>,

    /// Output amount quoted for the whole plan
    pub expected_output: Amount,

    /// Index of the step the service expects to run next
    #[serde(default)]
    pub current_step_index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_ms: Option<u64>,
}

impl PlanResponse {
    /// Finds the step with the given index.
    pub fn step(&self, step_index: u32) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.step_index == step_index)
    }

    /// Checks the structural guarantees the executor relies on.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::PlanValidation` when the plan has no steps, step
    /// indices are not strictly increasing, the current step does not exist,
    /// or the plan has already failed or been cancelled.
    pub fn validate(&self) -> Result<()> {
        if self.plan_id.trim().is_empty() {
            return Err(PlanError::validation("planId").with_reason("plan id is empty"));
        }
        if self.steps.is_empty() {
            return Err(PlanError::validation("steps")
                .with_reason(format!("plan {} has no steps", self.plan_id)));
        }
        for pair in self.steps.windows(2) {
            if pair[1].step_index <= pair[0].step_index {
                return Err(PlanError::validation("steps").with_reason(format!(
                    "step {} follows step {} in plan {}",
                    pair[1].step_index, pair[0].step_index, self.plan_id
                )));
            }
        }
        if self.step(self.current_step_index).is_none() {
            return Err(PlanError::validation("currentStepIndex").with_reason(format!(
                "current step {} is not part of plan {}",
                self.current_step_index, self.plan_id
            )));
        }
        if matches!(self.status, PlanStatus::Failed | PlanStatus::Cancelled) {
            return Err(PlanError::validation("status").with_reason(format!(
                "plan {} is already {}",
                self.plan_id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Transaction hashes of every submitted step, in step order.
    pub fn tx_hashes(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| s.tx_hash().map(String::from))
            .collect()
    }
}

/// Request body for creating a plan from an accepted quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub swapper: String,
    pub token_in: String,
    pub token_out: String,
    pub token_in_chain_id: ChainId,
    pub token_out_chain_id: ChainId,
    /// Exact input amount
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_tolerance: Option<f64>,
    /// Quote the trade was accepted from, forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<serde_json::Value>,
}

/// Proof report for one step, sent after the wallet signs or submits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepProofUpdate {
    pub step_index: u32,
    pub proof: StepProof,
}
