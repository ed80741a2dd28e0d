//! Result wrapper types for displaying engine outcomes.

use std::fmt;

use super::collections::Steps;
use crate::engine::{PlanExecutionOutcome, WatchOutcome};

/// Display wrapper for a finished step watch.
pub struct WatchResult<'a>(pub &'a WatchOutcome);

impl fmt::Display for WatchResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        writeln!(
            f,
            "Step {} of plan {} finished as {} after {} poll(s)",
            outcome.step.step_index,
            outcome.response.plan_id,
            outcome.step.status.with_icon(),
            outcome.attempts
        )?;
        writeln!(f)?;
        write!(f, "{}", Steps(outcome.steps.clone()))
    }
}

/// Display wrapper for a completed plan execution.
pub struct ExecutionResult<'a>(pub &'a PlanExecutionOutcome);

impl fmt::Display for ExecutionResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        writeln!(f, "Plan {} {}", outcome.plan_id, outcome.status)?;
        writeln!(f)?;
        if !outcome.tx_hashes.is_empty() {
            writeln!(f, "Transactions:")?;
            writeln!(f)?;
            for hash in &outcome.tx_hashes {
                writeln!(f, "- `{hash}`")?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", Steps(outcome.steps.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStatus;

    #[test]
    fn test_execution_result_lists_hashes() {
        let outcome = PlanExecutionOutcome {
            plan_id: "plan-1".to_string(),
            status: PlanStatus::Completed,
            steps: Vec::new(),
            tx_hashes: vec!["0x01".to_string(), "0x02".to_string()],
        };
        let text = ExecutionResult(&outcome).to_string();
        assert!(text.starts_with("Plan plan-1 completed"));
        assert!(text.contains("- `0x01`\n- `0x02`"));
        assert!(text.ends_with("No steps found.\n"));
    }
}
