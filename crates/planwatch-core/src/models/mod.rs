//! Data models for plans, steps and their client-side tracking records.
//!
//! Wire types ([`PlanResponse`], [`PlanStep`], [`PlanRequest`]) mirror the
//! planning service's JSON (camelCase fields, SCREAMING_SNAKE_CASE enums).
//! [`ActivePlanData`] is the local record owned by the
//! [`ActivePlanStore`](crate::store::ActivePlanStore) and
//! [`PlanTransaction`] is the wallet-visible history entry. Display
//! implementations live in [`crate::display`].
//!
//! # Examples
//!
//! ```rust
//! use planwatch_core::models::{Amount, PlanResponse, StepStatus};
//!
//! let json = r#"{
//!     "planId": "plan-1",
//!     "status": "ACTIVE",
//!     "swapper": "0xabc",
//!     "expectedOutput": "100000000",
//!     "currentStepIndex": 0,
//!     "steps": [
//!         {"stepIndex": 0, "stepType": "APPROVAL", "status": "AWAITING_ACTION", "method": "SEND_TX"},
//!         {"stepIndex": 1, "stepType": "CLASSIC_SWAP", "status": "AWAITING_ACTION", "method": "SEND_TX"}
//!     ]
//! }"#;
//!
//! let plan: PlanResponse = serde_json::from_str(json).unwrap();
//! assert_eq!(plan.expected_output, Amount::new(100_000_000));
//! assert_eq!(plan.step(1).unwrap().status, StepStatus::AwaitingAction);
//! assert!(plan.validate().is_ok());
//! ```

pub mod active;
pub mod amount;
pub mod chain;
pub mod plan;
pub mod status;
pub mod step;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use active::{transform_steps, ActivePlanData};
pub use amount::Amount;
pub use chain::{poll_interval_for, ChainId, DEFAULT_POLL_INTERVAL};
pub use plan::{PlanRequest, PlanResponse, StepProofUpdate};
pub use status::{PlanStatus, StepStatus};
pub use step::{PlanStep, StepMethod, StepProof, StepType};
pub use transaction::{normalize_address, PlanTransaction};
