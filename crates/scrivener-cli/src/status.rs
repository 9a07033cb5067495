//! `scrivener status`: show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use scrivener_core::config::{get_config_path, load_config, LlmConfig};
use scrivener_llm::RetryPolicy;
use scrivener_providers::registry::{find_by_name, resolve_api_base, PROVIDERS};

use crate::helpers::{home_available, mask_key};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "✒️ Scrivener Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    if !home_available() {
        println!(
            "  {:<18} {}",
            "".bold(),
            "home directory not found; `~` paths resolve to .".yellow()
        );
    }

    // Provider
    let llm = &config.llm;
    match find_by_name(&llm.provider) {
        Some(spec) => {
            println!("  {:<18} {}", "Provider:".bold(), spec.display_name);
            println!(
                "  {:<18} {}",
                "API base:".bold(),
                resolve_api_base(spec, llm.api_base.as_deref())
            );
        }
        None => println!(
            "  {:<18} {} {}",
            "Provider:".bold(),
            llm.provider,
            "(unsupported)".red()
        ),
    }
    println!("  {:<18} {}", "Model:".bold(), llm.model);
    println!(
        "  {:<18} {} | max_tokens: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", llm.temperature).dimmed(),
        format!("{}", llm.max_tokens).dimmed(),
        llm.timeout_secs,
    );
    println!("  {:<18} {}", "API key:".bold(), key_status(llm));

    // Retry policy
    let policy = RetryPolicy::from(&config.retry);
    println!(
        "  {:<18} {} attempts, {}s → {}s → … (cap {}s)",
        "Retry:".bold(),
        policy.attempt_budget(),
        policy.delay_for(0).as_secs(),
        policy.delay_for(1).as_secs(),
        policy.max_delay.as_secs(),
    );

    // Usage log
    let log_status = match config.usage_log.destination() {
        Some(path) => path.display().to_string(),
        None => format!("{}", "· disabled".dimmed()),
    };
    println!("  {:<18} {}", "Usage log:".bold(), log_status);

    // Every provider's conventional key
    println!();
    println!("  {}", "Environment keys:".bold());
    for spec in PROVIDERS {
        let status = match spec.env_key {
            None => format!("{}", "· no key needed".dimmed()),
            Some(var) if env_set(var) => format!("{} {}", "✓".green(), var),
            Some(var) => format!("{} {}", "·".dimmed(), var.dimmed()),
        };
        println!("    {:<20} {}", spec.display_name, status);
    }

    println!();

    Ok(())
}

/// Where the active provider's key comes from, masked.
fn key_status(llm: &LlmConfig) -> String {
    if llm.has_api_key() {
        return format!("{} {} (config)", "✓".green(), mask_key(&llm.api_key));
    }
    let Some(spec) = find_by_name(&llm.provider) else {
        return format!("{}", "· n/a".dimmed());
    };
    match spec.env_key {
        None => format!("{}", "· not required".dimmed()),
        Some(var) => match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => {
                format!("{} {} (${})", "✓".green(), mask_key(&key), var)
            }
            _ => format!("{} set llm.apiKey or ${}", "✗ missing:".red(), var),
        },
    }
}

fn env_set(var: &str) -> bool {
    std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false)
}
