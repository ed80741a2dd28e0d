//! Step-by-step plan execution.
//!
//! [`PlanEngine::execute`] acquires a plan (fresh or resumed), checks the
//! refreshed quote against the accepted trade, then walks the steps in
//! order: act on the step through the injected [`StepHandlers`], report the
//! proof, and wait for the step to finalize before moving on.

use std::collections::BTreeSet;

use log::{debug, error, info, warn};

use super::{PlanEngine, WatchPlanStep};
use crate::{
    analytics::{AnalyticsEvent, TradeMetadata},
    error::{ErrorClass, PlanError, Result},
    models::{
        transform_steps, ActivePlanData, Amount, ChainId, PlanRequest, PlanResponse, PlanStatus,
        PlanStep, StepMethod, StepProof, StepProofUpdate, StepStatus,
    },
    notify::AppNotification,
    price::require_accept_new_trade,
    signing::{StepContext, StepHandlers},
};

/// Plan id used in errors raised before the service assigned one.
const NEW_PLAN_ID: &str = "<new>";

/// Parameters for [`PlanEngine::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutePlan {
    /// Trade to create a plan for
    pub request: PlanRequest,

    /// Acting wallet address
    pub address: String,

    /// Output of the trade the user accepted
    pub original_output: Amount,

    /// Existing plan to refresh and resume instead of creating a new one
    pub resume_plan_id: Option<String>,

    /// The user already accepted a worse quote for this trade
    pub accepted_new_trade: bool,

    pub trade: TradeMetadata,
}

impl ExecutePlan {
    fn input_chain_id(&self) -> ChainId {
        self.request.token_in_chain_id
    }
}

/// Final state of a plan that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanExecutionOutcome {
    pub plan_id: String,
    pub status: PlanStatus,
    pub steps: Vec<PlanStep>,
    pub tx_hashes: Vec<String>,
}

impl PlanEngine {
    /// Runs a plan until every step completes.
    ///
    /// The plan becomes the store's active plan and holds the execution lock
    /// for the whole run; the lock is released on every exit path.
    ///
    /// # Errors
    ///
    /// - `PlanError::PlanPriceChange` when the refreshed quote dropped more
    ///   than the tolerated amount and the new trade was not accepted
    /// - `PlanError::PlanValidation` for malformed plans
    /// - `PlanError::HandledInterrupt` when the plan is cancelled
    /// - `PlanError::ExpectedPlan` when the user left the flow; the plan is
    ///   backgrounded and can be resumed
    /// - `PlanError::ShouldRetryPlan` for transient failures, including
    ///   transport and signing errors
    /// - `PlanError::AbortPlan` when the service failed the plan
    /// - `PlanError::UnsupportedBatchedCalls` for batched-call steps
    /// - `PlanError::PlanStepTimeout` when a step never finalizes
    pub async fn execute(
        &self,
        params: &ExecutePlan,
        handlers: &dyn StepHandlers,
    ) -> Result<PlanExecutionOutcome> {
        let fallback_id = params.resume_plan_id.as_deref().unwrap_or(NEW_PLAN_ID);
        let response = match self.acquire_plan(params).await {
            Ok(response) => response,
            Err(e) => return Err(into_retry(fallback_id, e)),
        };

        let plan_id = response.plan_id.clone();
        let input_chain_id = params.input_chain_id();
        self.store
            .set_active_plan(ActivePlanData::from_response(response.clone(), input_chain_id));
        let lock = self.store.acquire_execution_lock(&plan_id);

        let result = self.run_steps(params, handlers, response).await;
        drop(lock);

        match result {
            Ok(outcome) => {
                info!("Plan {plan_id} completed");
                self.store.clear_plan(&plan_id);
                self.notifications
                    .dispatch(AppNotification::SwapSucceeded { plan_id: plan_id.clone() });
                self.analytics.emit(AnalyticsEvent::PlanCompleted {
                    plan_id,
                    steps: outcome.steps.len(),
                });
                Ok(outcome)
            }
            Err(e) => Err(self.handle_failure(&plan_id, into_retry(&plan_id, e))),
        }
    }

    async fn acquire_plan(&self, params: &ExecutePlan) -> Result<PlanResponse> {
        let response = match &params.resume_plan_id {
            Some(plan_id) => {
                self.store.clear_cancelled_plan(plan_id);
                debug!("Refreshing plan {plan_id} for resumption");
                self.client.refresh_plan(plan_id).await?
            }
            None => self.client.create_plan(&params.request).await?,
        };

        if !params.accepted_new_trade
            && require_accept_new_trade(params.original_output, response.expected_output)
        {
            info!(
                "Plan {} output moved from {} to {}; waiting for acceptance",
                response.plan_id, params.original_output, response.expected_output
            );
            return Err(PlanError::PlanPriceChange {
                plan_id: response.plan_id,
                original_output: params.original_output.get(),
                new_output: response.expected_output.get(),
            });
        }

        response.validate()?;
        Ok(response)
    }

    async fn run_steps(
        &self,
        params: &ExecutePlan,
        handlers: &dyn StepHandlers,
        mut latest: PlanResponse,
    ) -> Result<PlanExecutionOutcome> {
        let plan_id = latest.plan_id.clone();
        let input_chain_id = params.input_chain_id();
        let mut completed: BTreeSet<u32> = BTreeSet::new();

        loop {
            self.ensure_not_cancelled(&plan_id)?;
            match latest.status {
                PlanStatus::Failed => {
                    return Err(PlanError::AbortPlan {
                        plan_id,
                        reason: "plan failed on the service".to_string(),
                    });
                }
                PlanStatus::Cancelled => return Err(PlanError::HandledInterrupt { plan_id }),
                PlanStatus::Active | PlanStatus::Completed => {}
            }

            let steps = transform_steps(&latest.steps, input_chain_id);
            let Some(step) = steps.into_iter().find(|s| s.status != StepStatus::Complete) else {
                return Ok(PlanExecutionOutcome {
                    tx_hashes: latest.tx_hashes(),
                    steps: transform_steps(&latest.steps, input_chain_id),
                    status: PlanStatus::Completed,
                    plan_id,
                });
            };

            if completed.contains(&step.step_index) {
                return Err(PlanError::AbortPlan {
                    plan_id,
                    reason: format!("step {} regressed after completing", step.step_index),
                });
            }

            let step_chain_id = step.chain_id.unwrap_or(input_chain_id);
            match step.status {
                StepStatus::AwaitingAction => {
                    let ctx = StepContext {
                        plan_id: &plan_id,
                        address: &params.address,
                        chain_id: step_chain_id,
                        step: &step,
                        trade: &params.trade,
                    };
                    let proof = dispatch_step(handlers, &ctx).await?;
                    self.report_proof(&plan_id, &step, proof).await?;
                    if step.step_type.is_swap() {
                        self.notifications.dispatch(AppNotification::SwapPending {
                            plan_id: plan_id.clone(),
                            chain_id: step_chain_id,
                        });
                    }
                }
                StepStatus::Pending => {
                    debug!("Step {} of plan {plan_id} already submitted", step.step_index);
                }
                StepStatus::Error => {
                    return Err(step_failed(&plan_id, &step));
                }
                StepStatus::Complete => {}
            }

            let outcome = self
                .watch_plan_step(&WatchPlanStep {
                    plan_id: plan_id.clone(),
                    target_step_index: step.step_index,
                    address: params.address.clone(),
                    step_chain_id: Some(step_chain_id),
                    source_chain_id: input_chain_id,
                    holds_execution_lock: true,
                })
                .await?;

            if outcome.step.status == StepStatus::Error {
                return Err(step_failed(&plan_id, &outcome.step));
            }
            completed.insert(step.step_index);
            latest = outcome.response;
        }
    }

    async fn report_proof(&self, plan_id: &str, step: &PlanStep, proof: StepProof) -> Result<()> {
        self.store
            .record_proof(plan_id, step.step_index, proof.clone());
        let update = StepProofUpdate {
            step_index: step.step_index,
            proof,
        };
        let updated = self.client.update_plan(plan_id, &update).await?;
        self.store.update_plan(&updated);
        Ok(())
    }

    fn ensure_not_cancelled(&self, plan_id: &str) -> Result<()> {
        if self.store.is_plan_cancelled(plan_id) {
            return Err(PlanError::HandledInterrupt {
                plan_id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// Applies store and notification side effects for a failed run.
    fn handle_failure(&self, plan_id: &str, err: PlanError) -> PlanError {
        match &err {
            PlanError::ExpectedPlan { reason, .. } => {
                info!("Plan {plan_id} moved to background: {reason}");
                self.store.background_plan(plan_id);
                self.analytics.emit(AnalyticsEvent::PlanInterrupted {
                    plan_id: plan_id.to_string(),
                    reason: reason.clone(),
                });
            }
            PlanError::HandledInterrupt { .. } => {
                info!("Plan {plan_id} cancelled");
                self.store.clear_plan(plan_id);
                self.notifications.dispatch(AppNotification::PlanCancelled {
                    plan_id: plan_id.to_string(),
                });
            }
            PlanError::PlanPriceChange { .. } => {
                debug!("Plan {plan_id} waiting for the new trade to be accepted");
            }
            _ => match err.classify() {
                ErrorClass::Retry => {
                    warn!("Plan {plan_id} can be retried: {err}");
                }
                _ => {
                    error!("Plan {plan_id} failed: {err}");
                    self.store.clear_plan(plan_id);
                    self.notifications.dispatch(AppNotification::SwapFailed {
                        plan_id: plan_id.to_string(),
                        reason: err.to_string(),
                    });
                }
            },
        }
        err
    }
}

async fn dispatch_step(handlers: &dyn StepHandlers, ctx: &StepContext<'_>) -> Result<StepProof> {
    debug!(
        "Acting on step {} ({}) of plan {}",
        ctx.step.step_index,
        ctx.step.step_type.as_str(),
        ctx.plan_id
    );
    match ctx.step.method {
        StepMethod::SendTx if ctx.step.step_type.is_swap() => handlers.send_swap(ctx).await,
        StepMethod::SendTx => handlers.approve(ctx).await,
        StepMethod::SignTypedData | StepMethod::SignMessage => handlers.sign(ctx).await,
        StepMethod::SendCalls => handlers.send_calls(ctx).await,
    }
}

fn step_failed(plan_id: &str, step: &PlanStep) -> PlanError {
    PlanError::ShouldRetryPlan {
        plan_id: plan_id.to_string(),
        reason: format!("step {} ({}) failed", step.step_index, step.step_type.as_str()),
    }
}

/// Transport and signing failures are transient: report them as retryable.
fn into_retry(plan_id: &str, err: PlanError) -> PlanError {
    match err {
        PlanError::Transport { .. } | PlanError::Signing { .. } => PlanError::ShouldRetryPlan {
            plan_id: plan_id.to_string(),
            reason: err.to_string(),
        },
        other => other,
    }
}
