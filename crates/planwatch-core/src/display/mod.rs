//! Display formatting for plans, steps and history.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and operation outcomes get newtype wrappers so each output
//! context can format them without touching the models.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers &      │    │   Markdown      │
//! │ (Plan, Step...) │───▶│ Result Types    │───▶│    Output       │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrappers (PlanTransactions, Steps)
//! - [`results`]: Outcome wrappers (WatchResult, ExecutionResult)
//! - [`status`]: One-line status messages (OperationStatus)
//! - [`datetime`]: Local time formatting
//! - [`models`]: Display implementations for domain models
//!
//! ## Usage Examples
//!
//! ```rust
//! use planwatch_core::display::OperationStatus;
//!
//! let done = OperationStatus::success("Plan plan-1 completed");
//! assert_eq!(done.to_string(), "Success: Plan plan-1 completed\n");
//!
//! let cancelled = OperationStatus::interrupted("Plan plan-1 was cancelled");
//! assert!(cancelled.to_string().starts_with("Stopped:"));
//! ```
//!
//! All formatters produce markdown for the CLI's terminal renderer.

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{PlanTransactions, Steps};
pub use datetime::LocalDateTime;
pub use results::{ExecutionResult, WatchResult};
pub use status::OperationStatus;
