//! Polling loop that waits for one plan step to finalize.

use std::sync::Arc;

use log::{debug, info, warn};

use super::PlanEngine;
use crate::{
    error::{PlanError, Result},
    models::{transform_steps, ChainId, PlanResponse, PlanStep, PlanTransaction},
};

/// Parameters for [`PlanEngine::watch_plan_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlanStep {
    pub plan_id: String,
    pub target_step_index: u32,
    /// Wallet address the history record is filed under
    pub address: String,
    /// Chain the target step runs on, when known
    pub step_chain_id: Option<ChainId>,
    /// Input chain of the plan
    pub source_chain_id: ChainId,
    /// Set by the executor that owns the plan's execution lock
    pub holds_execution_lock: bool,
}

impl WatchPlanStep {
    fn poll_chain(&self) -> ChainId {
        self.step_chain_id.unwrap_or(self.source_chain_id)
    }
}

/// Result of a finished watch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOutcome {
    /// Transformed steps of the latest response
    pub steps: Vec<PlanStep>,
    pub response: PlanResponse,
    /// The watched step in its terminal state
    pub step: PlanStep,
    /// Polls it took for the step to finalize
    pub attempts: u32,
}

impl PlanEngine {
    /// Polls the planning service until the target step is terminal.
    ///
    /// Each poll writes the plan into history and merges it into the store.
    /// When the step finalizes, swap and bridge steps trigger a background
    /// balance refresh before the outcome is returned.
    ///
    /// # Errors
    ///
    /// - `PlanError::HandledInterrupt` if the plan is cancelled before or
    ///   during polling
    /// - `PlanError::StepNotFound` if the response lacks the target step
    /// - `PlanError::PlanFetch` if the plan cannot be fetched or parsed
    /// - `PlanError::PlanStepTimeout` once the attempt budget is spent
    pub async fn watch_plan_step(&self, params: &WatchPlanStep) -> Result<WatchOutcome> {
        let result = self.poll_step(params).await;
        // Plans the store does not track have no later cleanup point
        self.store.release_untracked(&params.plan_id);
        result
    }

    async fn poll_step(&self, params: &WatchPlanStep) -> Result<WatchOutcome> {
        let plan_id = params.plan_id.as_str();
        let token = self.store.cancellation_token(plan_id);
        let chain = params.poll_chain();
        let max_attempts = self.config.max_attempts;

        debug!(
            "Watching step {} of plan {plan_id} on {chain}",
            params.target_step_index
        );

        for attempt in 1..=max_attempts {
            if self.store.is_plan_cancelled(plan_id) {
                return Err(interrupted(plan_id));
            }

            let response = self.client.get_plan(plan_id).await?;
            if response.plan_id != plan_id {
                return Err(PlanError::PlanFetch {
                    plan_id: plan_id.to_string(),
                    message: format!("service returned plan {}", response.plan_id),
                });
            }

            let step = response
                .step(params.target_step_index)
                .cloned()
                .ok_or_else(|| PlanError::StepNotFound {
                    plan_id: plan_id.to_string(),
                    step_index: params.target_step_index,
                })?;

            self.record_history(params, &response).await;
            self.store
                .merge_polled_plan(&response, params.holds_execution_lock);

            if step.is_terminal() {
                info!(
                    "Step {} of plan {plan_id} finished as {} after {attempt} poll(s)",
                    step.step_index,
                    step.status.as_str()
                );
                if step.step_type.changes_balances() {
                    self.spawn_balance_refresh(&params.address, step.chain_id.unwrap_or(chain));
                }
                return Ok(WatchOutcome {
                    steps: transform_steps(&response.steps, params.source_chain_id),
                    response,
                    step,
                    attempts: attempt,
                });
            }

            if attempt == max_attempts {
                break;
            }

            let delay = self.config.interval_for(Some(chain), attempt);
            tokio::select! {
                () = token.cancelled() => return Err(interrupted(plan_id)),
                () = tokio::time::sleep(delay) => {}
            }
        }

        warn!(
            "Gave up on step {} of plan {plan_id} after {max_attempts} attempts",
            params.target_step_index
        );
        Err(PlanError::PlanStepTimeout {
            plan_id: plan_id.to_string(),
            step_index: params.target_step_index,
            attempts: max_attempts,
        })
    }

    async fn record_history(&self, params: &WatchPlanStep, response: &PlanResponse) {
        let record =
            PlanTransaction::from_response(&params.address, params.source_chain_id, response);
        if let Err(e) = self.history.upsert(record).await {
            warn!("Failed to record history for plan {}: {e}", params.plan_id);
        }
    }

    fn spawn_balance_refresh(&self, address: &str, chain_id: ChainId) {
        let balances = Arc::clone(&self.balances);
        let address = address.to_string();
        tokio::spawn(async move {
            if let Err(e) = balances.refresh_balances(&address, chain_id).await {
                warn!("Balance refresh for {address} on {chain_id} failed: {e}");
            }
        });
    }
}

fn interrupted(plan_id: &str) -> PlanError {
    info!("Stopped watching plan {plan_id}: cancelled");
    PlanError::HandledInterrupt {
        plan_id: plan_id.to_string(),
    }
}
