//! Display implementations for domain models.
//!
//! Output is markdown: plans get a heading and a metadata list, steps a
//! sub-heading with their status icon.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    ActivePlanData, PlanResponse, PlanStatus, PlanStep, PlanTransaction, StepMethod, StepStatus,
    StepType,
};

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepMethod::SendTx => "send transaction",
            StepMethod::SignMessage => "sign message",
            StepMethod::SignTypedData => "sign typed data",
            StepMethod::SendCalls => "send calls",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### {}. {} ({})",
            self.step_index,
            self.step_type,
            self.status.with_icon()
        )?;
        writeln!(f)?;
        writeln!(f, "- Method: {}", self.method)?;
        if let Some(chain_id) = self.chain_id {
            writeln!(f, "- Chain: {chain_id}")?;
        }
        if let Some(amount) = self.token_in_amount {
            writeln!(f, "- Input: {amount}")?;
        }
        if let Some(amount) = self.token_out_amount {
            writeln!(f, "- Output: {amount}")?;
        }
        if let Some(slippage) = self.slippage {
            writeln!(f, "- Slippage: {slippage}%")?;
        }
        if let Some(proof) = &self.proof {
            if let Some(hash) = &proof.tx_hash {
                writeln!(f, "- Transaction: `{hash}`")?;
            }
            if let Some(order_id) = &proof.order_id {
                writeln!(f, "- Order: `{order_id}`")?;
            }
        }
        writeln!(f)
    }
}

impl fmt::Display for PlanResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Plan {}", self.plan_id)?;
        writeln!(f)?;
        writeln!(f, "- Status: {}", self.status)?;
        writeln!(f, "- Swapper: {}", self.swapper)?;
        writeln!(f, "- Expected output: {}", self.expected_output)?;
        writeln!(f, "- Current step: {}", self.current_step_index)?;
        if let Some(fee) = &self.gas_fee {
            writeln!(f, "- Gas fee: {fee}")?;
        }
        if let Some(ms) = self.time_estimate_ms {
            writeln!(f, "- Estimated time: {}s", ms.div_ceil(1000))?;
        }

        if self.steps.is_empty() {
            writeln!(f, "\nNo steps in this plan.")?;
        } else {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for step in &self.steps {
                write!(f, "{step}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ActivePlanData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let done = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Complete)
            .count();
        write!(
            f,
            "{} ({}/{} steps",
            self.plan_id,
            done,
            self.steps.len()
        )?;
        if self.proof_pending {
            write!(f, ", proof pending")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for PlanTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## {} ({}/{})",
            self.plan_id,
            self.completed_steps(),
            self.steps.len()
        )?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", self.status)?;
        writeln!(f, "- **Chain**: {}", self.chain_id)?;
        for hash in &self.tx_hashes {
            writeln!(f, "- **Tx**: `{hash}`")?;
        }
        writeln!(f, "- **Updated**: {}", LocalDateTime(&self.updated_at))?;
        writeln!(f)
    }
}
