//! Plan step model definition and related functionality.

use serde::{Deserialize, Serialize};

use super::{Amount, ChainId, StepStatus};

/// Kind of on-chain or off-chain action a step performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    /// ERC-20 allowance approval
    Approval,
    /// Permit2 signature
    Permit,
    /// Native token wrap or unwrap
    Wrap,
    /// Classic AMM swap transaction
    #[serde(alias = "CLASSIC")]
    ClassicSwap,
    /// Signed UniswapX order filled by a solver
    #[serde(rename = "UNISWAPX", alias = "DUTCH_V2", alias = "DUTCH_V3", alias = "PRIORITY")]
    UniswapX,
    /// Cross-chain bridge transaction
    Bridge,
    /// Any step type this client does not know
    #[serde(other)]
    Unknown,
}

impl StepType {
    /// Whether completing the step moves token balances.
    pub fn changes_balances(&self) -> bool {
        matches!(
            self,
            StepType::ClassicSwap | StepType::UniswapX | StepType::Bridge | StepType::Wrap
        )
    }

    /// Whether the step is the trade itself rather than a preparation step.
    pub fn is_swap(&self) -> bool {
        matches!(
            self,
            StepType::ClassicSwap | StepType::UniswapX | StepType::Bridge
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Approval => "approval",
            StepType::Permit => "permit",
            StepType::Wrap => "wrap",
            StepType::ClassicSwap => "classic_swap",
            StepType::UniswapX => "uniswapx",
            StepType::Bridge => "bridge",
            StepType::Unknown => "unknown",
        }
    }
}

/// How the wallet fulfils a step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepMethod {
    /// Sign and broadcast a transaction
    SendTx,
    /// Sign a plain message
    SignMessage,
    /// Sign EIP-712 typed data
    SignTypedData,
    /// Batched `wallet_sendCalls` submission
    SendCalls,
}

/// Evidence that a step was submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepProof {
    /// Transaction hash for transaction steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    /// Order identifier for signed off-chain orders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Signature for typed-data steps, reported back to the planner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl StepProof {
    /// Proof for a broadcast transaction.
    pub fn tx(hash: impl Into<String>) -> Self {
        Self {
            tx_hash: Some(hash.into()),
            ..Default::default()
        }
    }

    /// Proof for a signed off-chain order.
    pub fn order(order_id: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            signature: Some(signature.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tx_hash.is_none() && self.order_id.is_none() && self.signature.is_none()
    }
}

/// One atomic action within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// Position of the step within the plan
    pub step_index: u32,

    pub step_type: StepType,

    pub status: StepStatus,

    pub method: StepMethod,

    /// Chain the step executes on; defaults to the plan's input chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,

    /// Calldata, typed data or order payload, opaque to the engine
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Slippage tolerance in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_in_amount: Option<Amount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_out_amount: Option<Amount>,

    /// Submission proof, present once the step was sent or signed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<StepProof>,
}

impl PlanStep {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transaction hash from the proof, if any.
    pub fn tx_hash(&self) -> Option<&str> {
        self.proof.as_ref().and_then(|p| p.tx_hash.as_deref())
    }
}
