//! Signing capabilities and the wallet's step handlers.
//!
//! The executor never signs anything itself. It hands each step to a
//! [`StepHandlers`] implementation; [`WalletStepHandlers`] is the standard one,
//! built on injected per-chain [`ChainSigner`]s.

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    analytics::{AnalyticsEvent, AnalyticsSink, TradeMetadata},
    error::{PlanError, Result},
    models::{ChainId, PlanStep, StepMethod, StepProof},
};

/// Unsigned transaction built from a step payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRequest {
    pub chain_id: ChainId,
    pub from: String,
    /// Calldata object from the plan step (`to`, `data`, `value`, ...)
    pub payload: serde_json::Value,
}

/// Transaction with nonce and fees filled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedTransaction {
    pub request: TransactionRequest,
    pub nonce: Option<u64>,
    pub gas_limit: Option<u64>,
}

/// Signed, broadcastable transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedTransaction {
    pub chain_id: ChainId,
    /// RLP-encoded transaction as hex
    pub raw: String,
}

/// Chain-specific signing and submission primitives.
#[async_trait]
pub trait ChainSigner: Send + Sync {
    async fn prepare_transaction(&self, request: TransactionRequest) -> Result<PreparedTransaction>;

    async fn sign_transaction(&self, prepared: PreparedTransaction) -> Result<SignedTransaction>;

    /// Broadcasts the transaction and returns its hash.
    async fn send_transaction(&self, signed: SignedTransaction) -> Result<String>;

    async fn sign_typed_data(&self, address: &str, typed_data: &serde_json::Value) -> Result<String>;

    async fn sign_message(&self, address: &str, message: &serde_json::Value) -> Result<String>;
}

/// Resolves the signer to use for a chain.
pub trait SignerProvider: Send + Sync {
    /// Signer for `chain_id`, submitting through a private RPC when asked.
    fn signer(&self, chain_id: ChainId, private_rpc: bool) -> Result<Arc<dyn ChainSigner>>;
}

/// Chains whose transactions go through a private RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateRpcPolicy {
    chains: BTreeSet<ChainId>,
}

impl PrivateRpcPolicy {
    pub fn new(chains: impl IntoIterator<Item = ChainId>) -> Self {
        Self {
            chains: chains.into_iter().collect(),
        }
    }

    pub fn uses_private_rpc(&self, chain_id: ChainId) -> bool {
        self.chains.contains(&chain_id)
    }
}

/// Everything a handler needs to act on one step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub plan_id: &'a str,
    pub address: &'a str,
    /// Chain the step runs on
    pub chain_id: ChainId,
    pub step: &'a PlanStep,
    pub trade: &'a TradeMetadata,
}

/// Capability callbacks the executor uses to act on steps.
#[async_trait]
pub trait StepHandlers: Send + Sync {
    /// Sends an approval-style transaction (approval, permit, wrap).
    async fn approve(&self, ctx: &StepContext<'_>) -> Result<StepProof>;

    /// Sends the swap or bridge transaction.
    async fn send_swap(&self, ctx: &StepContext<'_>) -> Result<StepProof>;

    /// Signs typed data or a message for off-chain steps.
    async fn sign(&self, ctx: &StepContext<'_>) -> Result<StepProof>;

    /// Submits a batch of calls in one request.
    async fn send_calls(&self, ctx: &StepContext<'_>) -> Result<StepProof>;
}

/// Step handlers backed by the wallet's own signers.
pub struct WalletStepHandlers {
    signers: Arc<dyn SignerProvider>,
    private_rpc: PrivateRpcPolicy,
    analytics: Arc<dyn AnalyticsSink>,
}

impl WalletStepHandlers {
    pub fn new(
        signers: Arc<dyn SignerProvider>,
        private_rpc: PrivateRpcPolicy,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            signers,
            private_rpc,
            analytics,
        }
    }

    async fn submit_transaction(&self, ctx: &StepContext<'_>) -> Result<String> {
        let private_rpc = self.private_rpc.uses_private_rpc(ctx.chain_id);
        let signer = self.signers.signer(ctx.chain_id, private_rpc)?;
        debug!(
            "Submitting step {} of plan {} on chain {} (private rpc: {private_rpc})",
            ctx.step.step_index, ctx.plan_id, ctx.chain_id
        );

        let request = TransactionRequest {
            chain_id: ctx.chain_id,
            from: ctx.address.to_string(),
            payload: ctx.step.payload.clone(),
        };
        let prepared = signer.prepare_transaction(request).await?;
        let signed = signer.sign_transaction(prepared).await?;
        signer.send_transaction(signed).await
    }

    fn emit_submitted(&self, ctx: &StepContext<'_>, proof: &StepProof) {
        self.analytics.emit(AnalyticsEvent::SwapSubmitted {
            plan_id: ctx.plan_id.to_string(),
            step_index: ctx.step.step_index,
            chain_id: ctx.chain_id,
            step_type: ctx.step.step_type,
            tx_hash: proof.tx_hash.clone(),
            order_id: proof.order_id.clone(),
            trade: ctx.trade.clone(),
        });
    }
}

#[async_trait]
impl StepHandlers for WalletStepHandlers {
    async fn approve(&self, ctx: &StepContext<'_>) -> Result<StepProof> {
        let hash = self.submit_transaction(ctx).await?;
        Ok(StepProof::tx(hash))
    }

    async fn send_swap(&self, ctx: &StepContext<'_>) -> Result<StepProof> {
        let hash = self.submit_transaction(ctx).await?;
        let proof = StepProof::tx(hash);
        self.emit_submitted(ctx, &proof);
        Ok(proof)
    }

    async fn sign(&self, ctx: &StepContext<'_>) -> Result<StepProof> {
        let signer = self.signers.signer(ctx.chain_id, false)?;
        let signature = match ctx.step.method {
            StepMethod::SignMessage => signer.sign_message(ctx.address, &ctx.step.payload).await?,
            _ => signer.sign_typed_data(ctx.address, &ctx.step.payload).await?,
        };
        let proof = StepProof {
            order_id: ctx
                .step
                .payload
                .get("orderId")
                .and_then(|v| v.as_str())
                .map(String::from),
            signature: Some(signature),
            ..Default::default()
        };
        if ctx.step.step_type.is_swap() {
            self.emit_submitted(ctx, &proof);
        }
        Ok(proof)
    }

    async fn send_calls(&self, ctx: &StepContext<'_>) -> Result<StepProof> {
        Err(PlanError::UnsupportedBatchedCalls {
            plan_id: ctx.plan_id.to_string(),
            step_index: ctx.step.step_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_rpc_policy() {
        let policy = PrivateRpcPolicy::new([ChainId::ETHEREUM]);
        assert!(policy.uses_private_rpc(ChainId::ETHEREUM));
        assert!(!policy.uses_private_rpc(ChainId::BASE));
        assert!(!PrivateRpcPolicy::default().uses_private_rpc(ChainId::ETHEREUM));
    }
}
