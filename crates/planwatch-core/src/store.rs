//! Process-wide store for plans the client is tracking.
//!
//! The store holds at most one foreground plan, any number of backgrounded
//! plans, the set of plans marked for cancellation and the execution lock.
//! State lives in a [`tokio::sync::watch`] channel: every mutation is
//! synchronous and subscribers observe each change. All writes go through the
//! methods below; readers use the selector methods or [`ActivePlanStore::subscribe`].
//!
//! Several executors may run at once (one per plan), which is why the
//! execution lock is keyed by plan id and released with compare-and-clear.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::models::{ActivePlanData, PlanResponse, StepProof};

/// Snapshot of everything the store tracks.
#[derive(Debug, Clone, Default)]
pub struct ActivePlanState {
    /// Foreground plan, if any
    pub active_plan: Option<ActivePlanData>,

    /// Plans moved out of the foreground, keyed by plan id
    pub backgrounded_plans: BTreeMap<String, ActivePlanData>,

    /// Plans marked for cancellation
    pub cancelled_plan_ids: BTreeSet<String>,

    /// Plan whose executor currently owns in-flight calldata
    pub execution_lock_plan_id: Option<String>,

    cancellation_tokens: HashMap<String, CancellationToken>,
}

impl ActivePlanState {
    fn plan_mut(&mut self, plan_id: &str) -> Option<&mut ActivePlanData> {
        match self.active_plan.as_mut() {
            Some(active) if active.plan_id == plan_id => Some(active),
            _ => self.backgrounded_plans.get_mut(plan_id),
        }
    }

    /// Whether a cancellation token or mark is still kept for the plan.
    pub fn has_cancellation_state(&self, plan_id: &str) -> bool {
        self.cancellation_tokens.contains_key(plan_id) || self.cancelled_plan_ids.contains(plan_id)
    }

    fn is_tracked(&self, plan_id: &str) -> bool {
        self.active_plan
            .as_ref()
            .is_some_and(|active| active.plan_id == plan_id)
            || self.backgrounded_plans.contains_key(plan_id)
    }

    fn forget_cancellation(&mut self, plan_id: &str) -> bool {
        let had_token = self.cancellation_tokens.remove(plan_id).is_some();
        self.cancelled_plan_ids.remove(plan_id) || had_token
    }

    fn token(&mut self, plan_id: &str) -> CancellationToken {
        self.cancellation_tokens
            .entry(plan_id.to_string())
            .or_default()
            .clone()
    }
}

/// Shared, observable container for active and backgrounded plans.
#[derive(Debug)]
pub struct ActivePlanStore {
    state: watch::Sender<ActivePlanState>,
}

impl Default for ActivePlanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivePlanStore {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(ActivePlanState::default()),
        }
    }

    /// Makes `plan` the foreground plan.
    ///
    /// A different plan that was active is moved to the backgrounded map. If
    /// `plan` itself was backgrounded it is removed from there first.
    pub fn set_active_plan(&self, plan: ActivePlanData) {
        self.state.send_modify(|state| {
            state.backgrounded_plans.remove(&plan.plan_id);
            if let Some(previous) = state.active_plan.take() {
                if previous.plan_id != plan.plan_id {
                    info!(
                        "Backgrounding plan {} in favour of {}",
                        previous.plan_id, plan.plan_id
                    );
                    state
                        .backgrounded_plans
                        .insert(previous.plan_id.clone(), previous);
                }
            }
            debug!("Plan {} is now active", plan.plan_id);
            state.active_plan = Some(plan);
        });
    }

    /// Moves the active plan to the background if it is `plan_id`.
    ///
    /// Returns whether anything changed.
    pub fn background_plan(&self, plan_id: &str) -> bool {
        self.state.send_if_modified(|state| {
            match state.active_plan.take() {
                Some(active) if active.plan_id == plan_id => {
                    info!("Backgrounding plan {plan_id}");
                    state.backgrounded_plans.insert(active.plan_id.clone(), active);
                    true
                }
                other => {
                    state.active_plan = other;
                    false
                }
            }
        })
    }

    /// Removes the plan from the active slot or the backgrounded map.
    ///
    /// The plan's cancellation token and mark go with it. Unknown plan ids
    /// are ignored. Returns whether anything changed.
    pub fn clear_plan(&self, plan_id: &str) -> bool {
        self.state.send_if_modified(|state| {
            let removed = if state
                .active_plan
                .as_ref()
                .is_some_and(|active| active.plan_id == plan_id)
            {
                state.active_plan = None;
                debug!("Cleared active plan {plan_id}");
                true
            } else {
                state.backgrounded_plans.remove(plan_id).is_some()
            };
            state.forget_cancellation(plan_id) || removed
        })
    }

    /// Merges a fresh response into whichever slot holds the plan.
    ///
    /// Returns false when the plan is not tracked.
    pub fn update_plan(&self, response: &PlanResponse) -> bool {
        self.state.send_if_modified(|state| match state.plan_mut(&response.plan_id) {
            Some(plan) => {
                plan.merge_response(response.clone());
                true
            }
            None => false,
        })
    }

    /// Merges a response obtained by polling.
    ///
    /// While an executor holds the execution lock for the plan, only that
    /// executor (`holds_execution_lock`) may write; other pollers are
    /// skipped so they cannot clobber in-flight calldata.
    pub fn merge_polled_plan(&self, response: &PlanResponse, holds_execution_lock: bool) -> bool {
        self.state.send_if_modified(|state| {
            let locked = state.execution_lock_plan_id.as_deref() == Some(response.plan_id.as_str());
            if locked && !holds_execution_lock {
                debug!(
                    "Skipping polled update for plan {}: locked for execution",
                    response.plan_id
                );
                return false;
            }
            match state.plan_mut(&response.plan_id) {
                Some(plan) => {
                    plan.merge_response(response.clone());
                    true
                }
                None => false,
            }
        })
    }

    /// Records a locally produced proof for a step of a tracked plan.
    pub fn record_proof(&self, plan_id: &str, step_index: u32, proof: StepProof) {
        self.state.send_if_modified(|state| match state.plan_mut(plan_id) {
            Some(plan) => {
                plan.record_proof(step_index, proof);
                true
            }
            None => false,
        });
    }

    /// Takes the execution lock for `plan_id`.
    ///
    /// The lock is a single slot: a lock held for another plan is replaced
    /// and its previous holder is returned.
    pub fn lock_plan_for_execution(&self, plan_id: &str) -> Option<String> {
        let mut evicted = None;
        self.state.send_if_modified(|state| {
            if state.execution_lock_plan_id.as_deref() == Some(plan_id) {
                return false;
            }
            evicted = state.execution_lock_plan_id.replace(plan_id.to_string());
            true
        });
        if let Some(previous) = &evicted {
            warn!("Execution lock for plan {previous} evicted by plan {plan_id}");
        }
        evicted
    }

    /// Releases the execution lock only if it is still held for `plan_id`.
    ///
    /// Returns whether the lock was released.
    pub fn unlock_plan_for_execution(&self, plan_id: &str) -> bool {
        self.state.send_if_modified(|state| {
            if state.execution_lock_plan_id.as_deref() == Some(plan_id) {
                state.execution_lock_plan_id = None;
                true
            } else {
                false
            }
        })
    }

    /// Takes the execution lock and returns a guard that releases it on drop.
    pub fn acquire_execution_lock(self: &Arc<Self>, plan_id: &str) -> ExecutionLock {
        self.lock_plan_for_execution(plan_id);
        ExecutionLock {
            store: Arc::clone(self),
            plan_id: plan_id.to_string(),
        }
    }

    /// Marks the plan cancelled and fires its cancellation token.
    pub fn mark_plan_cancelled(&self, plan_id: &str) {
        let mut token = None;
        self.state.send_modify(|state| {
            state.cancelled_plan_ids.insert(plan_id.to_string());
            token = Some(state.token(plan_id));
        });
        if let Some(token) = token {
            token.cancel();
        }
        info!("Plan {plan_id} marked for cancellation");
    }

    pub fn is_plan_cancelled(&self, plan_id: &str) -> bool {
        self.state.borrow().cancelled_plan_ids.contains(plan_id)
    }

    /// Forgets a cancellation so the plan id can be watched again.
    pub fn clear_cancelled_plan(&self, plan_id: &str) -> bool {
        self.state.send_if_modified(|state| {
            state.cancellation_tokens.remove(plan_id);
            state.cancelled_plan_ids.remove(plan_id)
        })
    }

    /// Drops cancellation state kept for a plan the store does not track.
    ///
    /// Tracked plans keep theirs until [`ActivePlanStore::clear_plan`].
    pub fn release_untracked(&self, plan_id: &str) -> bool {
        self.state.send_if_modified(|state| {
            !state.is_tracked(plan_id) && state.forget_cancellation(plan_id)
        })
    }

    /// Token that fires when `plan_id` is marked cancelled.
    ///
    /// Already-cancelled plans get a token that has fired.
    pub fn cancellation_token(&self, plan_id: &str) -> CancellationToken {
        let mut token = None;
        self.state.send_if_modified(|state| {
            let created = !state.cancellation_tokens.contains_key(plan_id);
            token = Some(state.token(plan_id));
            created
        });
        token.unwrap_or_default()
    }

    pub fn active_plan(&self) -> Option<ActivePlanData> {
        self.state.borrow().active_plan.clone()
    }

    pub fn active_plan_id(&self) -> Option<String> {
        self.state
            .borrow()
            .active_plan
            .as_ref()
            .map(|plan| plan.plan_id.clone())
    }

    pub fn backgrounded_plan(&self, plan_id: &str) -> Option<ActivePlanData> {
        self.state.borrow().backgrounded_plans.get(plan_id).cloned()
    }

    pub fn backgrounded_plans(&self) -> Vec<ActivePlanData> {
        self.state
            .borrow()
            .backgrounded_plans
            .values()
            .cloned()
            .collect()
    }

    pub fn execution_lock_plan_id(&self) -> Option<String> {
        self.state.borrow().execution_lock_plan_id.clone()
    }

    /// Clone of the full current state.
    pub fn snapshot(&self) -> ActivePlanState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ActivePlanState> {
        self.state.subscribe()
    }
}

/// Execution lock held for one plan; released with compare-and-clear on drop.
#[derive(Debug)]
pub struct ExecutionLock {
    store: Arc<ActivePlanStore>,
    plan_id: String,
}

impl ExecutionLock {
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Whether this guard's plan still owns the lock.
    pub fn is_held(&self) -> bool {
        self.store.execution_lock_plan_id().as_deref() == Some(self.plan_id.as_str())
    }
}

impl Drop for ExecutionLock {
    fn drop(&mut self) {
        if self.store.unlock_plan_for_execution(&self.plan_id) {
            debug!("Released execution lock for plan {}", self.plan_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Amount, ChainId, PlanStatus, PlanStep, StepMethod, StepStatus, StepType,
    };

    fn create_test_plan(plan_id: &str) -> ActivePlanData {
        let response = PlanResponse {
            plan_id: plan_id.to_string(),
            status: PlanStatus::Active,
            swapper: "0xswapper".to_string(),
            steps: vec![PlanStep {
                step_index: 0,
                step_type: StepType::ClassicSwap,
                status: StepStatus::AwaitingAction,
                method: StepMethod::SendTx,
                chain_id: None,
                payload: serde_json::Value::Null,
                slippage: None,
                token_in_amount: None,
                token_out_amount: None,
                proof: None,
            }],
            gas_fee: None,
            expected_output: Amount::new(1_000),
            current_step_index: 0,
            time_estimate_ms: None,
        };
        ActivePlanData::from_response(response, ChainId::ETHEREUM)
    }

    #[test]
    fn test_set_active_plan_backgrounds_previous() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.set_active_plan(create_test_plan("b"));

        assert_eq!(store.active_plan_id().as_deref(), Some("b"));
        assert!(store.backgrounded_plan("a").is_some());
        assert_eq!(store.backgrounded_plans().len(), 1);
    }

    #[test]
    fn test_set_active_plan_resumes_backgrounded_plan() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.set_active_plan(create_test_plan("b"));
        store.set_active_plan(create_test_plan("a"));

        assert_eq!(store.active_plan_id().as_deref(), Some("a"));
        assert!(store.backgrounded_plan("a").is_none());
        assert!(store.backgrounded_plan("b").is_some());
    }

    #[test]
    fn test_set_same_plan_twice_does_not_background_it() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.set_active_plan(create_test_plan("a"));

        assert_eq!(store.active_plan_id().as_deref(), Some("a"));
        assert!(store.backgrounded_plans().is_empty());
    }

    #[test]
    fn test_background_plan_only_affects_active_plan() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));

        assert!(!store.background_plan("other"));
        assert_eq!(store.active_plan_id().as_deref(), Some("a"));

        assert!(store.background_plan("a"));
        assert!(store.active_plan().is_none());
        assert!(store.backgrounded_plan("a").is_some());
    }

    #[test]
    fn test_clear_plan() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.set_active_plan(create_test_plan("b"));

        assert!(store.clear_plan("a"));
        assert!(store.backgrounded_plan("a").is_none());
        assert!(store.clear_plan("b"));
        assert!(store.active_plan().is_none());
        assert!(!store.clear_plan("unknown"));
    }

    #[test]
    fn test_clear_plan_drops_cancellation_state() {
        let store = ActivePlanStore::new();
        for i in 0..100 {
            let plan_id = format!("plan-{i}");
            store.set_active_plan(create_test_plan(&plan_id));
            let token = store.cancellation_token(&plan_id);
            store.mark_plan_cancelled(&plan_id);
            assert!(store.clear_plan(&plan_id));
            assert!(token.is_cancelled());
        }

        let state = store.snapshot();
        assert!(state.cancellation_tokens.is_empty());
        assert!(state.cancelled_plan_ids.is_empty());

        // Nothing tracked, but a stray mark is still released
        store.mark_plan_cancelled("stray");
        assert!(store.clear_plan("stray"));
        assert!(!store.snapshot().has_cancellation_state("stray"));
    }

    #[test]
    fn test_release_untracked_keeps_tracked_plans() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.cancellation_token("a");
        store.cancellation_token("standalone");

        assert!(!store.release_untracked("a"));
        assert!(store.snapshot().has_cancellation_state("a"));

        assert!(store.release_untracked("standalone"));
        assert!(!store.snapshot().has_cancellation_state("standalone"));
        assert!(!store.release_untracked("standalone"));
    }

    #[test]
    fn test_unlock_is_compare_and_clear() {
        let store = ActivePlanStore::new();
        assert_eq!(store.lock_plan_for_execution("a"), None);

        assert!(!store.unlock_plan_for_execution("b"));
        assert_eq!(store.execution_lock_plan_id().as_deref(), Some("a"));

        assert!(store.unlock_plan_for_execution("a"));
        assert_eq!(store.execution_lock_plan_id(), None);
    }

    #[test]
    fn test_second_lock_evicts_first() {
        let store = ActivePlanStore::new();
        store.lock_plan_for_execution("a");
        assert_eq!(store.lock_plan_for_execution("b").as_deref(), Some("a"));
        assert_eq!(store.execution_lock_plan_id().as_deref(), Some("b"));
    }

    #[test]
    fn test_stale_guard_does_not_release_newer_lock() {
        let store = Arc::new(ActivePlanStore::new());
        let stale = store.acquire_execution_lock("a");
        let fresh = store.acquire_execution_lock("b");

        assert!(!stale.is_held());
        drop(stale);
        assert_eq!(store.execution_lock_plan_id().as_deref(), Some("b"));

        drop(fresh);
        assert_eq!(store.execution_lock_plan_id(), None);
    }

    #[test]
    fn test_locked_plan_ignores_foreign_polls() {
        let store = ActivePlanStore::new();
        store.set_active_plan(create_test_plan("a"));
        store.lock_plan_for_execution("a");

        let mut polled = create_test_plan("a").response;
        polled.steps[0].status = StepStatus::Pending;

        assert!(!store.merge_polled_plan(&polled, false));
        assert!(store.merge_polled_plan(&polled, true));
        let active = store.active_plan().unwrap();
        assert_eq!(active.steps[0].status, StepStatus::Pending);
    }

    #[test]
    fn test_cancellation_set_and_token() {
        let store = ActivePlanStore::new();
        let token = store.cancellation_token("a");
        assert!(!token.is_cancelled());
        assert!(!store.is_plan_cancelled("a"));

        store.mark_plan_cancelled("a");
        assert!(store.is_plan_cancelled("a"));
        assert!(token.is_cancelled());
        assert!(store.cancellation_token("a").is_cancelled());

        assert!(store.clear_cancelled_plan("a"));
        assert!(!store.is_plan_cancelled("a"));
        assert!(!store.cancellation_token("a").is_cancelled());
    }

    #[test]
    fn test_cancellation_does_not_touch_lock() {
        let store = ActivePlanStore::new();
        store.lock_plan_for_execution("a");
        store.mark_plan_cancelled("a");
        assert_eq!(store.execution_lock_plan_id().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = ActivePlanStore::new();
        let mut rx = store.subscribe();

        store.set_active_plan(create_test_plan("a"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update()
                .active_plan
                .as_ref()
                .map(|p| p.plan_id.as_str()),
            Some("a")
        );

        assert!(!store.background_plan("zzz"));
        assert!(!rx.has_changed().unwrap());
    }
}
