//! App-level notifications raised during a plan's lifecycle.

use std::sync::Arc;

use log::{info, warn};

use crate::models::ChainId;

/// Toast-style notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppNotification {
    /// A swap step was submitted and is waiting for confirmation
    SwapPending { plan_id: String, chain_id: ChainId },
    /// The plan finished successfully
    SwapSucceeded { plan_id: String },
    /// The plan failed
    SwapFailed { plan_id: String, reason: String },
    /// The plan was cancelled by the user
    PlanCancelled { plan_id: String },
}

impl AppNotification {
    /// Stable kind name used by notification consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            AppNotification::SwapPending { .. } => "swap_pending",
            AppNotification::SwapSucceeded { .. } => "swap_succeeded",
            AppNotification::SwapFailed { .. } => "swap_failed",
            AppNotification::PlanCancelled { .. } => "plan_cancelled",
        }
    }

    pub fn plan_id(&self) -> &str {
        match self {
            AppNotification::SwapPending { plan_id, .. }
            | AppNotification::SwapSucceeded { plan_id }
            | AppNotification::SwapFailed { plan_id, .. }
            | AppNotification::PlanCancelled { plan_id } => plan_id,
        }
    }

    /// Builds a notification from its kind name, if the kind is known.
    pub fn from_kind(kind: &str, plan_id: &str, chain_id: ChainId) -> Option<Self> {
        let plan_id = plan_id.to_string();
        match kind {
            "swap_pending" => Some(AppNotification::SwapPending { plan_id, chain_id }),
            "swap_succeeded" => Some(AppNotification::SwapSucceeded { plan_id }),
            "swap_failed" => Some(AppNotification::SwapFailed {
                plan_id,
                reason: "unknown".to_string(),
            }),
            "plan_cancelled" => Some(AppNotification::PlanCancelled { plan_id }),
            _ => None,
        }
    }
}

/// Receiver of app notifications (a toast queue, a log, a channel).
pub trait NotificationSink: Send + Sync {
    fn push(&self, notification: AppNotification);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifications;

impl NotificationSink for LogNotifications {
    fn push(&self, notification: AppNotification) {
        info!("[{}] plan {}", notification.kind(), notification.plan_id());
    }
}

/// Generic dispatch surface in front of a [`NotificationSink`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn dispatch(&self, notification: AppNotification) {
        self.sink.push(notification);
    }

    /// Dispatches by kind name. Unknown kinds are logged and dropped.
    ///
    /// Returns whether a notification was dispatched.
    pub fn dispatch_kind(&self, kind: &str, plan_id: &str, chain_id: ChainId) -> bool {
        match AppNotification::from_kind(kind, plan_id, chain_id) {
            Some(notification) => {
                self.dispatch(notification);
                true
            }
            None => {
                warn!("Dropping unknown notification kind '{kind}' for plan {plan_id}");
                false
            }
        }
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifications))
    }
}
