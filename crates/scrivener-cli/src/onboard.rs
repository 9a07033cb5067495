//! `scrivener onboard`: initialize configuration and output directory.
//!
//! - Creates `~/.scrivener/config.json` with defaults
//! - Creates the usage-log directory

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use scrivener_core::config::{get_config_path, load_config, save_config, Config};
use scrivener_core::utils::get_output_path;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "✒️ Scrivener — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let config = ensure_config(&config_path)?;

    // Usage log directory, or the default output dir when logging is off
    let output_dir = config
        .usage_log
        .destination()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(get_output_path);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    println!("  {} output dir at {}", "✓".green(), output_dir.display());

    println!();
    println!(
        "{}",
        format!(
            "  Setup complete! Set llm.provider / llm.model in {} and run `scrivener ask -m \"hello\"`.",
            config_path.display()
        )
        .green()
    );
    println!();

    Ok(())
}

/// Write a default config at `path` unless one exists; return the config in effect.
fn ensure_config(path: &Path) -> Result<Config> {
    if path.exists() {
        println!("  {} config already exists at {}", "✓".green(), path.display());
        return Ok(load_config(Some(path)));
    }
    let config = Config::default();
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} created config at {}", "✓".green(), path.display());
    Ok(config)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_config_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ensure_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.llm.provider, "openai-compatible");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("usageLog").is_some());
    }

    #[test]
    fn ensure_config_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"llm": {"provider": "ollama", "model": "llama3.2"}}"#).unwrap();

        let config = ensure_config(&path).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"llm": {"provider": "ollama", "model": "llama3.2"}}"#
        );
    }
}
