//! Scrivener CLI: entry point.
//!
//! # Commands
//!
//! - `scrivener ask -m PROMPT [--system TEXT]`: one resilient LLM call
//! - `scrivener summarize FILE`: summarize a saved job description
//! - `scrivener match TEXT OPTION...`: pick the closest option (offline)
//! - `scrivener onboard`: write default config, create output directory
//! - `scrivener status`: show configuration and provider status

mod helpers;
mod onboard;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use scrivener_core::config::{load_config, Config};
use scrivener_core::types::{InvocationRequest, Message};
use scrivener_llm::{
    best_match, Answerer, CancellationToken, ResilientInvoker, RetryPolicy, UsageLogger,
};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// ✒️ Scrivener: resilient LLM calls for job-application documents
#[derive(Parser)]
#[command(name = "scrivener", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt through the configured provider
    Ask {
        /// Prompt text
        #[arg(short, long)]
        message: String,

        /// Optional system message sent before the prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Summarize a job description read from a file ("-" for stdin)
    Summarize {
        file: PathBuf,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Pick the option closest to TEXT by edit distance
    Match {
        text: String,

        #[arg(required = true)]
        options: Vec<String>,
    },

    /// Initialize configuration and output directory
    Onboard,

    /// Show configuration and provider status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            message,
            system,
            logs,
        } => {
            init_logging(logs);
            run_ask(message, system).await
        }
        Commands::Summarize { file, logs } => {
            init_logging(logs);
            run_summarize(&file).await
        }
        Commands::Match { text, options } => run_match(&text, &options),
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_ask(message: String, system: Option<String>) -> Result<()> {
    let config = load_config(None);
    let answerer = build_answerer(&config)?;

    let request = match system {
        Some(system) => {
            InvocationRequest::messages(vec![Message::system(system), Message::user(message)])
        }
        None => InvocationRequest::prompt(message),
    };

    info!(model = answerer.model().model_name(), "sending prompt");
    helpers::print_thinking();
    let result = answerer.ask(request).await;
    helpers::clear_thinking();

    let reply = result.context("LLM call failed")?;
    helpers::print_response(&reply);
    Ok(())
}

async fn run_summarize(file: &std::path::Path) -> Result<()> {
    let text = helpers::read_input(file)?;
    if text.trim().is_empty() {
        bail!("{} is empty", file.display());
    }

    let config = load_config(None);
    let answerer = build_answerer(&config)?;

    helpers::print_thinking();
    let result = answerer.summarize_job_description(&text).await;
    helpers::clear_thinking();

    let summary = result.context("summarizing job description failed")?;
    helpers::print_response(&summary);
    Ok(())
}

fn run_match(text: &str, options: &[String]) -> Result<()> {
    let chosen = best_match(text, options).context("no options given")?;
    println!("{chosen}");
    Ok(())
}

/// Build an `Answerer` from the loaded configuration. Ctrl-C cancels any
/// call it makes.
pub fn build_answerer(config: &Config) -> Result<Answerer> {
    let model = scrivener_providers::from_config(&config.llm).with_context(|| {
        format!(
            "failed to set up provider '{}' (model '{}')",
            config.llm.provider, config.llm.model
        )
    })?;

    let sink = Arc::new(UsageLogger::from_config(&config.usage_log));
    let invoker = ResilientInvoker::new(RetryPolicy::from(&config.retry), sink);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            trigger.cancel();
        }
    });

    Ok(Answerer::new(model, invoker).with_cancellation(cancel))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("scrivener=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
