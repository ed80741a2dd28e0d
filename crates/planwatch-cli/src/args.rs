//! Command-line arguments.
//!
//! Clap types live here and convert into core parameter types with `From`,
//! so the core crate stays free of CLI concerns.

use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};
use planwatch_core::{models::ChainId, WatchConfig, WatchPlanStep, MAX_ATTEMPTS};

/// Watch multi-step swap plans and inspect their history
#[derive(Parser)]
#[command(version, about, name = "pw")]
pub struct Args {
    /// Base URL of the planning service
    #[arg(long, global = true, env = "PLANWATCH_API_URL")]
    pub api_url: Option<String>,

    /// API key sent with every planning service request
    #[arg(long, global = true, env = "PLANWATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the SQLite history file. Defaults to
    /// $XDG_DATA_HOME/planwatch/history.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and watch plans on the planning service
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Recorded plan transactions
    #[command(alias = "h")]
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Fetch a plan and show its steps
    #[command(alias = "s")]
    Show(ShowPlanArgs),
    /// Poll a plan until one of its steps finishes
    ///
    /// Press Ctrl-C to stop watching; the plan is marked cancelled and the
    /// command exits cleanly.
    #[command(alias = "w")]
    Watch(WatchPlanArgs),
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List plan transactions for an address
    #[command(aliases = ["l", "ls"])]
    List(ListHistoryArgs),
}

#[derive(ClapArgs)]
pub struct ShowPlanArgs {
    /// Plan identifier assigned by the planning service
    pub plan_id: String,
}

#[derive(ClapArgs)]
pub struct WatchPlanArgs {
    /// Plan identifier assigned by the planning service
    pub plan_id: String,

    /// Index of the step to wait for
    #[arg(long)]
    pub step: u32,

    /// Wallet address the plan belongs to
    #[arg(long)]
    pub address: String,

    /// Chain the step runs on; picks the polling interval
    #[arg(long)]
    pub chain: Option<ChainId>,

    /// Input chain of the plan, used as the history key. Defaults to --chain
    /// or Ethereum
    #[arg(long)]
    pub source_chain: Option<ChainId>,

    /// Fixed polling interval in milliseconds instead of the per-chain one
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Polls before giving up
    #[arg(long, default_value_t = MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl WatchPlanArgs {
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            max_attempts: self.max_attempts,
            poll_interval: self.interval_ms.map(Duration::from_millis),
        }
    }
}

impl From<WatchPlanArgs> for WatchPlanStep {
    fn from(val: WatchPlanArgs) -> Self {
        let source_chain_id = val.source_chain.or(val.chain).unwrap_or(ChainId::ETHEREUM);
        WatchPlanStep {
            plan_id: val.plan_id,
            target_step_index: val.step,
            address: val.address,
            step_chain_id: val.chain,
            source_chain_id,
            holds_execution_lock: false,
        }
    }
}

#[derive(ClapArgs)]
pub struct ListHistoryArgs {
    /// Wallet address to list
    #[arg(long)]
    pub address: String,

    /// Only show plans on this chain
    #[arg(long)]
    pub chain: Option<ChainId>,
}
