//! my-agent: plan-and-act coding assistant for the terminal
//!
//! Turns natural-language instructions into file reads, confirmed writes,
//! shell commands and rollbacks, planning multi-step work when needed.

mod action;
mod agent;
mod backup;
mod config;
mod error;
mod executor;
mod input;
mod memory;
mod planner;
mod progress;
mod repl;
#[cfg(test)]
mod testing;
mod tools;
mod ui;
mod workspace;

use anyhow::Result;
use clap::Parser;
use llm_core::{Gateway, GatewayConfig, OpenRouterClient};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::Orchestrator;
use crate::backup::BackupManager;
use crate::config::{EnvOverrides, UserConfig};
use crate::input::TerminalPrompter;

#[derive(Debug, Parser)]
#[command(name = "my-agent")]
#[command(about = "Plan-and-act coding assistant for the terminal", version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Model to use (overrides config and MY_AGENT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Instruction to run once; starts the interactive session when omitted
    instruction: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        let path = UserConfig::create_default()?;
        ui::success(format!("Created config at {}", path.display()));
        return Ok(());
    }

    load_env_files();

    let env_config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            ui::error(format!("{:#}", e));
            eprintln!("Set OPENROUTER_API_KEY in your environment or in a .env file.");
            std::process::exit(1);
        }
    };

    let user_config = UserConfig::load().unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "Ignoring unreadable config");
        UserConfig::default()
    });
    let gateway_config = user_config.apply(env_config, cli.model, EnvOverrides::from_env());
    let model = gateway_config.model.clone();
    debug!(?gateway_config, "Gateway configured");

    let gateway: Arc<dyn Gateway> = Arc::new(OpenRouterClient::new(gateway_config)?);
    let working_dir = std::env::current_dir()?;
    let ctx = user_config.tools.context(working_dir);
    let mut orchestrator = Orchestrator::new(gateway, BackupManager::shared(), ctx);
    let mut prompter = TerminalPrompter::new(user_config.repl.history_size)?;

    if cli.instruction.is_empty() {
        return repl::run(
            &mut orchestrator,
            &mut prompter,
            &model,
            user_config.repl.show_welcome,
        )
        .await;
    }

    let instruction = cli.instruction.join(" ");
    let outcome = orchestrator.handle(&instruction, &mut prompter).await;
    if outcome.is_failure() {
        drop(prompter);
        std::process::exit(1);
    }
    Ok(())
}

/// `.env.local` wins over `.env`; neither overrides the real environment
fn load_env_files() {
    for file in [".env.local", ".env"] {
        match dotenvy::from_filename(file) {
            Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(file, error = %e, "Could not load environment file"),
        }
    }
}
