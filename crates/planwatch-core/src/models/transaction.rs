//! Wallet-visible history record for a plan.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{ChainId, PlanResponse, PlanStatus, PlanStep};

/// Plan transaction as shown in the wallet's activity list.
///
/// Records are keyed by `(address, chain_id, plan_id)`; writing a record for
/// an existing key replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanTransaction {
    pub plan_id: String,

    /// Swapper address, lowercased
    pub address: String,

    /// Chain the plan is listed under (the input chain)
    pub chain_id: ChainId,

    pub status: PlanStatus,

    pub steps: Vec<PlanStep>,

    /// Hashes of submitted transactions in step order
    #[serde(default)]
    pub tx_hashes: Vec<String>,

    /// Timestamp when the record was last written (UTC)
    pub updated_at: Timestamp,
}

impl PlanTransaction {
    /// Snapshot of a plan response for the given address and chain.
    pub fn from_response(address: &str, chain_id: ChainId, response: &PlanResponse) -> Self {
        Self {
            plan_id: response.plan_id.clone(),
            address: normalize_address(address),
            chain_id,
            status: response.status,
            steps: response.steps.clone(),
            tx_hashes: response.tx_hashes(),
            updated_at: Timestamp::now(),
        }
    }

    /// Number of steps that finished successfully.
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == super::StepStatus::Complete)
            .count()
    }
}

/// Canonical form used for history keys.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
