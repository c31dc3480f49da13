pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod interaction_log;
pub mod logging;
pub mod model;
pub mod providers;
pub mod repl;
pub mod server;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use cli::{Cli, Command};
use client::{Answerer, CompletionClient, answer_text};
use config::Config;
use interaction_log::InteractionLog;
use repl::run_repl;
use server::{AppState, CorsPolicy};

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = Config::from_env().context("Invalid configuration")?;
    info!(
        api_url = %cfg.api_url,
        model = %cfg.model,
        request_timeout_secs = cfg.request_timeout_secs,
        interaction_log = %cfg.interaction_log_path.display(),
        "loaded runtime configuration"
    );

    let client = CompletionClient::from_config(&cfg)?;
    let log = InteractionLog::new(cfg.interaction_log_path.clone());

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_repl(&client, &log).await,
        Command::Ask { question } => ask_once(&client, &log, &question.join(" ")).await,
        Command::Serve { bind } => {
            let state = AppState::new(
                Arc::new(client),
                Arc::new(log),
                CorsPolicy::new(&cfg.cors_allowed_origins),
            );
            server::run(bind.unwrap_or(cfg.bind_addr), state).await
        }
    }
}

async fn ask_once(answerer: &dyn Answerer, log: &InteractionLog, question: &str) -> Result<()> {
    let result = answerer.ask(question).await;
    if let Err(err) = log.record(question, &answer_text(result.clone())) {
        warn!(
            path = %log.path().display(),
            error = %err,
            "failed to append interaction record"
        );
    }

    let answer = result?;
    println!("{}", answer);
    Ok(())
}
