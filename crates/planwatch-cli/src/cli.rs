//! Command handlers.
//!
//! Each handler builds what it needs (a planning service client, an engine
//! or just the history database), runs one operation and renders the result
//! as markdown. Handled interrupts are reported as a status line, not as an
//! error.

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use planwatch_core::{
    display::{OperationStatus, PlanTransactions, WatchResult},
    HttpPlanClient, PlanClient, PlanEngineBuilder, PlanTransactionStore, SqliteHistory,
    WatchPlanStep,
};

use crate::{
    args::{HistoryCommands, ListHistoryArgs, PlanCommands, ShowPlanArgs, WatchPlanArgs},
    renderer::TerminalRenderer,
};

/// Planning service settings taken from global flags.
pub struct ServiceConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

pub struct Cli {
    service: ServiceConfig,
    database_file: Option<PathBuf>,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(
        service: ServiceConfig,
        database_file: Option<PathBuf>,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            service,
            database_file,
            renderer,
        }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Show(args) => self.show_plan(args).await,
            PlanCommands::Watch(args) => self.watch_plan(args).await,
        }
    }

    pub async fn handle_history_command(&self, command: HistoryCommands) -> Result<()> {
        match command {
            HistoryCommands::List(args) => self.list_history(args).await,
        }
    }

    fn client(&self) -> Result<Arc<HttpPlanClient>> {
        let api_url = self.service.api_url.as_deref().ok_or_else(|| {
            anyhow!("No planning service configured; pass --api-url or set PLANWATCH_API_URL")
        })?;
        debug!("Using planning service at {api_url}");
        Ok(Arc::new(HttpPlanClient::new(
            api_url,
            self.service.api_key.clone(),
        )))
    }

    fn database_path(&self) -> Result<PathBuf> {
        match &self.database_file {
            Some(path) => Ok(path.clone()),
            None => PlanEngineBuilder::default_database_path()
                .context("Failed to resolve the default history path"),
        }
    }

    async fn show_plan(&self, args: ShowPlanArgs) -> Result<()> {
        let client = self.client()?;
        let plan = client
            .get_plan(&args.plan_id)
            .await
            .with_context(|| format!("Failed to fetch plan {}", args.plan_id))?;
        self.renderer.render(&plan.to_string())
    }

    async fn watch_plan(&self, args: WatchPlanArgs) -> Result<()> {
        let engine = PlanEngineBuilder::new(self.client()?)
            .with_database_path(Some(self.database_path()?))
            .with_watch_config(args.watch_config())
            .build()
            .await
            .context("Failed to initialize plan engine")?;
        let params = WatchPlanStep::from(args);

        let store = Arc::clone(engine.store());
        let plan_id = params.plan_id.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling plan {plan_id}");
                store.mark_plan_cancelled(&plan_id);
            }
        });

        let result = engine.watch_plan_step(&params).await;
        interrupt.abort();

        match result {
            Ok(outcome) => self.renderer.render(&WatchResult(&outcome).to_string()),
            Err(e) if e.is_handled_interrupt() => self
                .renderer
                .render(&OperationStatus::interrupted(e.to_string()).to_string()),
            Err(e) => Err(e).with_context(|| {
                format!(
                    "Failed to watch step {} of plan {}",
                    params.target_step_index, params.plan_id
                )
            }),
        }
    }

    async fn list_history(&self, args: ListHistoryArgs) -> Result<()> {
        let history = SqliteHistory::open(self.database_path()?)
            .await
            .context("Failed to open history database")?;
        let records = history
            .list(&args.address, args.chain)
            .await
            .context("Failed to list plan transactions")?;
        self.renderer
            .render(&PlanTransactions(records).to_string())
    }
}
