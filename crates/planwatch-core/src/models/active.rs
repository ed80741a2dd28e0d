//! Client-side tracking record for a plan held in the store.

use log::warn;
use serde::{Deserialize, Serialize};

use super::{ChainId, PlanResponse, PlanStatus, PlanStep, StepProof};

/// Local view of a plan being executed or watched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivePlanData {
    pub plan_id: String,

    /// Chain the plan's input token lives on
    pub input_chain_id: ChainId,

    /// Steps sorted by index with chain ids filled in
    pub steps: Vec<PlanStep>,

    /// A proof was produced locally but the service has not reflected it yet
    pub proof_pending: bool,

    pub current_step_index: u32,

    /// Latest response received for the plan
    pub response: PlanResponse,
}

impl ActivePlanData {
    /// Builds tracking data from a fresh plan response.
    pub fn from_response(response: PlanResponse, input_chain_id: ChainId) -> Self {
        Self {
            plan_id: response.plan_id.clone(),
            input_chain_id,
            steps: transform_steps(&response.steps, input_chain_id),
            proof_pending: false,
            current_step_index: response.current_step_index,
            response,
        }
    }

    /// The step the plan is currently on.
    pub fn current_step(&self) -> Option<&PlanStep> {
        self.step(self.current_step_index)
    }

    pub fn step(&self, step_index: u32) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.step_index == step_index)
    }

    /// Records a locally produced proof until the service reflects it.
    pub fn record_proof(&mut self, step_index: u32, proof: StepProof) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.step_index == step_index) {
            step.proof = Some(proof);
            self.proof_pending = true;
        }
    }

    /// Merges a newer response into the local record.
    ///
    /// Step statuses only move forward; a regressed status from the service
    /// keeps the local value unless the plan itself was cancelled. Locally
    /// recorded proofs survive responses that do not carry one yet.
    pub fn merge_response(&mut self, response: PlanResponse) {
        let allow_regression = response.status == PlanStatus::Cancelled;
        let mut merged = transform_steps(&response.steps, self.input_chain_id);

        for step in &mut merged {
            let Some(local) = self.step(step.step_index) else {
                continue;
            };
            if !allow_regression && local.status.regresses_to(step.status) {
                warn!(
                    "Ignoring status regression for step {} of plan {}: {} -> {}",
                    step.step_index,
                    self.plan_id,
                    local.status.as_str(),
                    step.status.as_str()
                );
                step.status = local.status;
            }
            if step.proof.is_none() {
                step.proof = local.proof.clone();
            }
        }

        self.proof_pending = self.proof_pending
            && self.steps.iter().any(|local| {
                local.proof.is_some()
                    && response
                        .step(local.step_index)
                        .is_some_and(|remote| remote.proof.is_none())
            });
        self.steps = merged;
        self.current_step_index = response.current_step_index;
        self.response = response;
    }
}

/// Sorts steps by index and fills in missing chain ids.
pub fn transform_steps(steps: &[PlanStep], input_chain_id: ChainId) -> Vec<PlanStep> {
    let mut out: Vec<PlanStep> = steps
        .iter()
        .cloned()
        .map(|mut step| {
            if step.chain_id.is_none() {
                step.chain_id = Some(input_chain_id);
            }
            step
        })
        .collect();
    out.sort_by_key(|s| s.step_index);
    out
}
