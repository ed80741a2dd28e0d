//! Plan engine: the watch loop and the execution saga.
//!
//! [`PlanEngine`] ties together the collaborators a plan run needs and
//! exposes the two long-running operations:
//!
//! - [`PlanEngine::watch_plan_step`] polls the planning service until one
//!   step of a plan finalizes.
//! - [`PlanEngine::execute`] drives a plan from creation or resumption
//!   through every step until it completes, fails or is interrupted.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   StepHandlers  │    │   PlanEngine    │    │   PlanClient    │
//! │ (sign / submit) │◀───│ execute / watch │───▶│ (remote plans)  │
//! └─────────────────┘    └────────┬────────┘    └─────────────────┘
//!                                 │
//!                 ┌───────────────┼────────────────┐
//!                 ▼               ▼                ▼
//!          ActivePlanStore   history store   notifications
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for [`PlanEngine`] instances
//! - [`watch`]: Polling loop for a single step
//! - [`execute`]: Step-by-step plan execution
//!
//! # Example
//!
//! ```rust,no_run
//! use planwatch_core::{
//!     engine::{PlanEngineBuilder, WatchPlanStep},
//!     client::HttpPlanClient,
//!     models::ChainId,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpPlanClient::new("https://trading.example.com/v1", None));
//! let engine = PlanEngineBuilder::new(client).build().await?;
//!
//! let outcome = engine
//!     .watch_plan_step(&WatchPlanStep {
//!         plan_id: "plan-123".to_string(),
//!         target_step_index: 1,
//!         address: "0xabc".to_string(),
//!         step_chain_id: None,
//!         source_chain_id: ChainId::ETHEREUM,
//!         holds_execution_lock: false,
//!     })
//!     .await?;
//! println!("step finished as {}", outcome.step.status);
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    analytics::AnalyticsSink,
    client::PlanClient,
    error::Result,
    history::PlanTransactionStore,
    models::{poll_interval_for, ChainId},
    notify::NotificationDispatcher,
    store::ActivePlanStore,
};

pub mod builder;
pub mod execute;
pub mod watch;


pub use builder::PlanEngineBuilder;
pub use execute::{ExecutePlan, PlanExecutionOutcome};
pub use watch::{WatchOutcome, WatchPlanStep};

/// Maximum number of polls for one step before giving up.
pub const MAX_ATTEMPTS: u32 = 60;

/// Polling configuration for the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Polls per step before `PlanStepTimeout`
    pub max_attempts: u32,

    /// Fixed base interval; `None` uses the per-chain table
    pub poll_interval: Option<Duration>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            poll_interval: None,
        }
    }
}

impl WatchConfig {
    /// Delay before the next poll, given how many polls already happened.
    ///
    /// Once half the attempt budget is spent the interval doubles.
    pub fn interval_for(&self, chain: Option<ChainId>, polls_done: u32) -> Duration {
        let base = self
            .poll_interval
            .unwrap_or_else(|| poll_interval_for(chain));
        if polls_done >= self.max_attempts / 2 {
            base.saturating_mul(2)
        } else {
            base
        }
    }
}

/// Refreshes wallet balances after a step that moved tokens.
#[async_trait]
pub trait BalanceRefresher: Send + Sync {
    async fn refresh_balances(&self, address: &str, chain_id: ChainId) -> Result<()>;
}

/// Balance refresher that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBalances;

#[async_trait]
impl BalanceRefresher for NoopBalances {
    async fn refresh_balances(&self, _address: &str, _chain_id: ChainId) -> Result<()> {
        Ok(())
    }
}

/// Coordinator for watching and executing plans.
pub struct PlanEngine {
    pub(crate) client: Arc<dyn PlanClient>,
    pub(crate) store: Arc<ActivePlanStore>,
    pub(crate) history: Arc<dyn PlanTransactionStore>,
    pub(crate) balances: Arc<dyn BalanceRefresher>,
    pub(crate) notifications: NotificationDispatcher,
    pub(crate) analytics: Arc<dyn AnalyticsSink>,
    pub(crate) config: WatchConfig,
}

impl PlanEngine {
    /// Shared store the engine reads and writes.
    pub fn store(&self) -> &Arc<ActivePlanStore> {
        &self.store
    }

    /// History backend the watch loop writes to.
    pub fn history(&self) -> &Arc<dyn PlanTransactionStore> {
        &self.history
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }
}
