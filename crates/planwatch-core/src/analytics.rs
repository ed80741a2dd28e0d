//! Fire-and-forget analytics events emitted by the executor.

use log::info;
use serde::Serialize;

use crate::models::{Amount, ChainId, StepType};

/// Trade details attached to analytics events.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetadata {
    pub token_in: String,
    pub token_out: String,
    pub input_amount: Amount,
    pub expected_output: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
}

/// Named analytics event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    /// A swap-type step was handed to the network or solver
    SwapSubmitted {
        plan_id: String,
        step_index: u32,
        chain_id: ChainId,
        step_type: StepType,
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_hash: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
        trade: TradeMetadata,
    },
    /// Every step of the plan completed
    PlanCompleted { plan_id: String, steps: usize },
    /// The plan stopped early without being an error
    PlanInterrupted { plan_id: String, reason: String },
}

/// Receiver of analytics events. Emission never affects plan execution.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

/// Sink that writes events to the log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn emit(&self, event: AnalyticsEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!("analytics: {json}"),
            Err(e) => info!("analytics: {event:?} ({e})"),
        }
    }
}
