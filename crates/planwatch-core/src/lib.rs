//! Core library for watching and executing multi-step swap plans.
//!
//! A plan is a server-tracked sequence of blockchain operations (approvals,
//! swaps, signatures, bridges). This crate drives a plan from creation to
//! completion, polls the planning service for step finalization, and keeps
//! a process-wide store of the plans the client is tracking.
//!
//! # Architecture
//!
//! - **Models** ([`models`]): wire types and local tracking records
//! - **Store** ([`store`]): observable active/backgrounded plans, the
//!   cancellation set and the execution lock
//! - **Engine** ([`engine`]): the watch loop and the execution saga
//! - **Collaborators**: the planning service ([`client`]), signers and step
//!   handlers ([`signing`]), history ([`history`], backed by [`db`]),
//!   notifications ([`notify`]) and analytics ([`analytics`])
//! - **Display** ([`display`]): markdown formatting for the CLI
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use planwatch_core::{HttpPlanClient, PlanEngineBuilder, WatchPlanStep, models::ChainId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpPlanClient::new("https://trading.example.com/v1", None));
//! let engine = PlanEngineBuilder::new(client)
//!     .with_database_path(Some("history.db"))
//!     .build()
//!     .await?;
//!
//! // Cancelling from another task interrupts the watch mid-delay
//! let store = engine.store().clone();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     store.mark_plan_cancelled("plan-123");
//! });
//!
//! match engine
//!     .watch_plan_step(&WatchPlanStep {
//!         plan_id: "plan-123".to_string(),
//!         target_step_index: 0,
//!         address: "0xabc".to_string(),
//!         step_chain_id: Some(ChainId::BASE),
//!         source_chain_id: ChainId::ETHEREUM,
//!         holds_execution_lock: false,
//!     })
//!     .await
//! {
//!     Ok(outcome) => println!("{}", outcome.step),
//!     Err(e) if e.is_handled_interrupt() => println!("stopped"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod client;
pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod notify;
pub mod price;
pub mod signing;
pub mod store;

// Re-export commonly used types
pub use client::{HttpPlanClient, PlanClient};
pub use db::Database;
pub use display::{ExecutionResult, OperationStatus, PlanTransactions, Steps, WatchResult};
pub use engine::{
    ExecutePlan, PlanEngine, PlanEngineBuilder, PlanExecutionOutcome, WatchConfig, WatchOutcome,
    WatchPlanStep, MAX_ATTEMPTS,
};
pub use error::{ErrorClass, PlanError, Result};
pub use history::{MemoryHistory, PlanTransactionStore, SqliteHistory};
pub use models::{
    ActivePlanData, Amount, ChainId, PlanRequest, PlanResponse, PlanStatus, PlanStep,
    PlanTransaction, StepStatus,
};
pub use store::{ActivePlanState, ActivePlanStore, ExecutionLock};
