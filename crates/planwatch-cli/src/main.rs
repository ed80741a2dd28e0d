//! Planwatch CLI Application
//!
//! Command-line client for inspecting and watching multi-step swap plans.

mod args;
mod cli;
mod renderer;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::{Cli, ServiceConfig};
use log::info;
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        api_url,
        api_key,
        database_file,
        no_color,
        command,
    } = Args::parse();

    let cli = Cli::new(
        ServiceConfig { api_url, api_key },
        database_file,
        TerminalRenderer::new(!no_color),
    );

    info!("Planwatch started");

    match command {
        Commands::Plan { command } => cli.handle_plan_command(command).await,
        Commands::History { command } => cli.handle_history_command(command).await,
    }
}
