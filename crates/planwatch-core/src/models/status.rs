//! Status enumerations for plans and steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of plan statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// Plan still has steps to run
    #[default]
    Active,

    /// Every step finished successfully
    Completed,

    /// The backend marked the plan as failed
    Failed,

    /// The plan was cancelled before completion
    Cancelled,
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(PlanStatus::Active),
            "completed" => Ok(PlanStatus::Completed),
            "failed" => Ok(PlanStatus::Failed),
            "cancelled" | "canceled" => Ok(PlanStatus::Cancelled),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl PlanStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
            PlanStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the plan can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlanStatus::Active)
    }
}

/// Type-safe enumeration of step statuses.
///
/// Statuses are ordered: a step moves from `AwaitingAction` to `Pending` and
/// then to one of the terminal states `Complete` or `Error`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Waiting for the user to sign or submit
    AwaitingAction,

    /// Submitted and waiting for on-chain or solver confirmation
    Pending,

    /// Confirmed
    Complete,

    /// Failed on-chain or rejected by the solver
    Error,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "awaiting_action" | "awaitingaction" => Ok(StepStatus::AwaitingAction),
            "pending" => Ok(StepStatus::Pending),
            "complete" => Ok(StepStatus::Complete),
            "error" => Ok(StepStatus::Error),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::AwaitingAction => "awaiting_action",
            StepStatus::Pending => "pending",
            StepStatus::Complete => "complete",
            StepStatus::Error => "error",
        }
    }

    /// Whether the step has finalized, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Error)
    }

    /// Position of the status in the forward-only lifecycle.
    pub fn rank(&self) -> u8 {
        match self {
            StepStatus::AwaitingAction => 0,
            StepStatus::Pending => 1,
            StepStatus::Complete | StepStatus::Error => 2,
        }
    }

    /// Whether moving from `self` to `next` would go backwards.
    ///
    /// Terminal states are final, so switching between `Complete` and
    /// `Error` also counts as a regression.
    pub fn regresses_to(&self, next: StepStatus) -> bool {
        if self.is_terminal() {
            return *self != next;
        }
        next.rank() < self.rank()
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use planwatch_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Complete.with_icon(), "✓ Complete");
    /// assert_eq!(StepStatus::Pending.with_icon(), "➤ Pending");
    /// assert_eq!(StepStatus::AwaitingAction.with_icon(), "○ Awaiting Action");
    /// assert_eq!(StepStatus::Error.with_icon(), "✗ Error");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Complete => "✓ Complete",
            StepStatus::Pending => "➤ Pending",
            StepStatus::AwaitingAction => "○ Awaiting Action",
            StepStatus::Error => "✗ Error",
        }
    }
}
