#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use planwatch_core::{
    analytics::{AnalyticsEvent, AnalyticsSink},
    engine::{BalanceRefresher, PlanEngine, PlanEngineBuilder, WatchConfig},
    models::{
        Amount, ChainId, PlanRequest, PlanResponse, PlanStatus, PlanStep, StepMethod, StepProof,
        StepProofUpdate, StepStatus, StepType,
    },
    notify::{AppNotification, NotificationSink},
    signing::{
        ChainSigner, PreparedTransaction, SignedTransaction, SignerProvider, TransactionRequest,
    },
    store::ActivePlanStore,
    MemoryHistory, PlanClient, PlanError, Result,
};
use tokio::sync::mpsc;

pub const SWAPPER: &str = "0xAbC0000000000000000000000000000000000001";

pub fn step(index: u32, step_type: StepType, method: StepMethod, status: StepStatus) -> PlanStep {
    PlanStep {
        step_index: index,
        step_type,
        status,
        method,
        chain_id: None,
        payload: serde_json::json!({ "to": "0xrouter", "data": "0x" }),
        slippage: None,
        token_in_amount: None,
        token_out_amount: None,
        proof: None,
    }
}

pub fn plan(plan_id: &str, expected_output: u128, steps: Vec<PlanStep>) -> PlanResponse {
    let current_step_index = steps
        .iter()
        .find(|s| s.status != StepStatus::Complete)
        .or(steps.last())
        .map_or(0, |s| s.step_index);
    PlanResponse {
        plan_id: plan_id.to_string(),
        status: PlanStatus::Active,
        swapper: SWAPPER.to_string(),
        steps,
        gas_fee: None,
        expected_output: Amount::new(expected_output),
        current_step_index,
        time_estimate_ms: None,
    }
}

/// Approval followed by a classic swap, both waiting for the wallet.
pub fn approve_and_swap(plan_id: &str, expected_output: u128) -> PlanResponse {
    plan(
        plan_id,
        expected_output,
        vec![
            step(0, StepType::Approval, StepMethod::SendTx, StepStatus::AwaitingAction),
            step(1, StepType::ClassicSwap, StepMethod::SendTx, StepStatus::AwaitingAction),
        ],
    )
}

pub fn swap_request() -> PlanRequest {
    PlanRequest {
        swapper: SWAPPER.to_string(),
        token_in: "0xusdc".to_string(),
        token_out: "0xweth".to_string(),
        token_in_chain_id: ChainId::BASE,
        token_out_chain_id: ChainId::BASE,
        amount: Amount::new(1_000_000),
        slippage_tolerance: Some(0.5),
        quote: None,
    }
}

/// In-process stand-in for the planning service.
///
/// Reported proofs move a step to Pending; each `get_plan` call counts
/// towards confirmation and after `polls_to_confirm` calls the step becomes
/// Complete (or Error for steps listed in `failing_steps`).
pub struct FakePlanService {
    plan: Mutex<PlanResponse>,
    refreshed_output: Mutex<Option<Amount>>,
    pending_polls: Mutex<HashMap<u32, u32>>,
    polls_to_confirm: AtomicU32,
    failing_steps: Mutex<Vec<u32>>,
    omit_steps: Mutex<Vec<u32>>,
    pub get_calls: AtomicU32,
    pub create_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
    pub updates: Mutex<Vec<StepProofUpdate>>,
}

impl FakePlanService {
    pub fn new(plan: PlanResponse) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan),
            refreshed_output: Mutex::new(None),
            pending_polls: Mutex::new(HashMap::new()),
            polls_to_confirm: AtomicU32::new(1),
            failing_steps: Mutex::new(Vec::new()),
            omit_steps: Mutex::new(Vec::new()),
            get_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
            refresh_calls: AtomicU32::new(0),
            updates: Mutex::new(Vec::new()),
        })
    }

    pub fn confirm_after(&self, polls: u32) {
        self.polls_to_confirm.store(polls, Ordering::SeqCst);
    }

    pub fn fail_step(&self, step_index: u32) {
        self.failing_steps.lock().unwrap().push(step_index);
    }

    /// Leaves the step out of every `get_plan` response.
    pub fn omit_step(&self, step_index: u32) {
        self.omit_steps.lock().unwrap().push(step_index);
    }

    pub fn refresh_with_output(&self, output: u128) {
        *self.refreshed_output.lock().unwrap() = Some(Amount::new(output));
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> PlanResponse {
        self.plan.lock().unwrap().clone()
    }

    fn advance(&self) -> PlanResponse {
        let target = self.polls_to_confirm.load(Ordering::SeqCst);
        let failing = self.failing_steps.lock().unwrap().clone();
        let mut pending = self.pending_polls.lock().unwrap();
        let mut plan = self.plan.lock().unwrap();

        for step in plan.steps.iter_mut() {
            if step.status != StepStatus::Pending {
                continue;
            }
            let seen = pending.entry(step.step_index).or_insert(0);
            *seen += 1;
            if *seen >= target {
                step.status = if failing.contains(&step.step_index) {
                    StepStatus::Error
                } else {
                    StepStatus::Complete
                };
            }
        }
        Self::settle(&mut plan);
        plan.clone()
    }

    fn settle(plan: &mut PlanResponse) {
        if let Some(next) = plan.steps.iter().find(|s| s.status != StepStatus::Complete) {
            plan.current_step_index = next.step_index;
        } else {
            plan.status = PlanStatus::Completed;
        }
    }
}

#[async_trait]
impl PlanClient for FakePlanService {
    async fn create_plan(&self, _request: &PlanRequest) -> Result<PlanResponse> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.current())
    }

    async fn get_plan(&self, plan_id: &str) -> Result<PlanResponse> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut response = self.advance();
        if response.plan_id != plan_id {
            return Err(PlanError::PlanFetch {
                plan_id: plan_id.to_string(),
                message: "404 Not Found".to_string(),
            });
        }
        let omitted = self.omit_steps.lock().unwrap().clone();
        response.steps.retain(|s| !omitted.contains(&s.step_index));
        Ok(response)
    }

    async fn refresh_plan(&self, _plan_id: &str) -> Result<PlanResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut plan = self.plan.lock().unwrap();
        if let Some(output) = *self.refreshed_output.lock().unwrap() {
            plan.expected_output = output;
        }
        Ok(plan.clone())
    }

    async fn update_plan(&self, _plan_id: &str, update: &StepProofUpdate) -> Result<PlanResponse> {
        self.updates.lock().unwrap().push(update.clone());
        let mut plan = self.plan.lock().unwrap();
        if let Some(step) = plan
            .steps
            .iter_mut()
            .find(|s| s.step_index == update.step_index)
        {
            step.status = StepStatus::Pending;
            step.proof = Some(update.proof.clone());
        }
        Ok(plan.clone())
    }
}

/// Signer that hands out sequential fake hashes.
#[derive(Default)]
pub struct FakeSigner {
    sent: AtomicU32,
}

#[async_trait]
impl ChainSigner for FakeSigner {
    async fn prepare_transaction(&self, request: TransactionRequest) -> Result<PreparedTransaction> {
        Ok(PreparedTransaction {
            request,
            nonce: Some(7),
            gas_limit: Some(21_000),
        })
    }

    async fn sign_transaction(&self, prepared: PreparedTransaction) -> Result<SignedTransaction> {
        Ok(SignedTransaction {
            chain_id: prepared.request.chain_id,
            raw: format!("0xsigned-{}", prepared.request.chain_id.0),
        })
    }

    async fn send_transaction(&self, _signed: SignedTransaction) -> Result<String> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("0xhash{n}"))
    }

    async fn sign_typed_data(&self, _address: &str, _typed_data: &serde_json::Value) -> Result<String> {
        Ok("0xtyped".to_string())
    }

    async fn sign_message(&self, _address: &str, _message: &serde_json::Value) -> Result<String> {
        Ok("0xmessage".to_string())
    }
}

/// Signer provider that records which chains were requested.
#[derive(Default)]
pub struct FakeSigners {
    signer: Arc<FakeSigner>,
    pub requests: Mutex<Vec<(ChainId, bool)>>,
}

impl SignerProvider for FakeSigners {
    fn signer(&self, chain_id: ChainId, private_rpc: bool) -> Result<Arc<dyn ChainSigner>> {
        self.requests.lock().unwrap().push((chain_id, private_rpc));
        let signer: Arc<dyn ChainSigner> = self.signer.clone();
        Ok(signer)
    }
}

#[derive(Default)]
pub struct RecordingNotifications(pub Mutex<Vec<AppNotification>>);

impl NotificationSink for RecordingNotifications {
    fn push(&self, notification: AppNotification) {
        self.0.lock().unwrap().push(notification);
    }
}

impl RecordingNotifications {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().iter().map(|n| n.kind()).collect()
    }
}

#[derive(Default)]
pub struct RecordingAnalytics(pub Mutex<Vec<AnalyticsEvent>>);

impl AnalyticsSink for RecordingAnalytics {
    fn emit(&self, event: AnalyticsEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Balance refresher that reports each refresh on a channel.
pub struct ChannelBalances(pub mpsc::UnboundedSender<(String, ChainId)>);

#[async_trait]
impl BalanceRefresher for ChannelBalances {
    async fn refresh_balances(&self, address: &str, chain_id: ChainId) -> Result<()> {
        let _ = self.0.send((address.to_string(), chain_id));
        Ok(())
    }
}

/// Engine wired to fakes, plus handles to inspect them.
pub struct TestHarness {
    pub engine: PlanEngine,
    pub service: Arc<FakePlanService>,
    pub store: Arc<ActivePlanStore>,
    pub history: Arc<MemoryHistory>,
    pub notifications: Arc<RecordingNotifications>,
    pub analytics: Arc<RecordingAnalytics>,
    pub balances: mpsc::UnboundedReceiver<(String, ChainId)>,
}

/// Builds an engine around `plan` with the given polling configuration.
pub async fn create_test_engine(plan: PlanResponse, config: WatchConfig) -> TestHarness {
    let service = FakePlanService::new(plan);
    let store = Arc::new(ActivePlanStore::new());
    let history = Arc::new(MemoryHistory::new());
    let notifications = Arc::new(RecordingNotifications::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let (tx, balances) = mpsc::unbounded_channel();

    let engine = PlanEngineBuilder::new(service.clone())
        .with_store(store.clone())
        .with_history(history.clone())
        .with_notification_sink(notifications.clone())
        .with_analytics(analytics.clone())
        .with_balance_refresher(Arc::new(ChannelBalances(tx)))
        .with_watch_config(config)
        .build()
        .await
        .expect("Failed to build engine");

    TestHarness {
        engine,
        service,
        store,
        history,
        notifications,
        analytics,
        balances,
    }
}

/// Watch configuration with a short fixed interval.
pub fn fast_config(max_attempts: u32) -> WatchConfig {
    WatchConfig {
        max_attempts,
        poll_interval: Some(Duration::from_millis(1)),
    }
}
