//! Config loader: reads `~/.scrivener/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.scrivener/config.json`
//! 3. Environment variables `SCRIVENER_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Flat keys from older config files and where they live now.
const LEGACY_LLM_KEYS: &[(&str, &str)] = &[
    ("LLM_MODEL_TYPE", "provider"),
    ("LLM_MODEL", "model"),
    ("LLM_API_URL", "apiBase"),
];

/// Apply legacy config migrations.
///
/// Moves top-level `LLM_MODEL_TYPE` / `LLM_MODEL` / `LLM_API_URL` into the
/// `llm` section without overwriting values already set there.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };

    for (legacy, field) in LEGACY_LLM_KEYS {
        let Some(value) = root.remove(*legacy) else {
            continue;
        };
        let llm = root
            .entry("llm")
            .or_insert_with(|| serde_json::Value::Object(Default::default()));
        if let Some(llm) = llm.as_object_mut() {
            if !llm.contains_key(*field) {
                llm.insert(field.to_string(), value);
                debug!("Migrated {} → llm.{}", legacy, field);
            }
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `SCRIVENER_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `SCRIVENER_LLM__PROVIDER` → `llm.provider`
/// - `SCRIVENER_LLM__MODEL` → `llm.model`
/// - `SCRIVENER_LLM__API_KEY` → `llm.api_key`
/// - `SCRIVENER_LLM__API_BASE` → `llm.api_base`
/// - `SCRIVENER_LLM__TEMPERATURE` → `llm.temperature`
/// - `SCRIVENER_RETRY__MAX_ATTEMPTS` → `retry.max_attempts`
/// - `SCRIVENER_RETRY__BASE_DELAY_MS` → `retry.base_delay_ms`
/// - `SCRIVENER_USAGE_LOG__PATH` → `usage_log.path`
/// - `SCRIVENER_USAGE_LOG__ENABLED` → `usage_log.enabled`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("SCRIVENER_LLM__PROVIDER") {
        config.llm.provider = val;
    }
    if let Ok(val) = std::env::var("SCRIVENER_LLM__MODEL") {
        config.llm.model = val;
    }
    if let Ok(val) = std::env::var("SCRIVENER_LLM__API_KEY") {
        config.llm.api_key = val;
    }
    if let Ok(val) = std::env::var("SCRIVENER_LLM__API_BASE") {
        config.llm.api_base = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIVENER_LLM__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.llm.temperature = t;
        }
    }

    if let Ok(val) = std::env::var("SCRIVENER_RETRY__MAX_ATTEMPTS") {
        if let Ok(n) = val.parse::<u32>() {
            config.retry.max_attempts = n;
        }
    }
    if let Ok(val) = std::env::var("SCRIVENER_RETRY__BASE_DELAY_MS") {
        if let Ok(n) = val.parse::<u64>() {
            config.retry.base_delay_ms = n;
        }
    }

    if let Ok(val) = std::env::var("SCRIVENER_USAGE_LOG__PATH") {
        config.usage_log.path = val;
    }
    if let Ok(val) = std::env::var("SCRIVENER_USAGE_LOG__ENABLED") {
        config.usage_log.enabled = val == "true" || val == "1";
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.retry.max_delay_ms, 300_000);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "llm": {
                "provider": "claude",
                "maxTokens": 2048
            },
            "retry": { "maxDelayMs": 60000 }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.llm.provider, "claude");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.retry.max_delay_ms, 60_000);
        // Default preserved
        assert_eq!(config.llm.timeout_secs, 120);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.llm.max_tokens, 4096);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.llm.provider = "gemini".to_string();
        config.usage_log.price_per_output_token = 0.5;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.llm.provider, "gemini");
        assert_eq!(reloaded.usage_log.price_per_output_token, 0.5);
    }

    #[test]
    fn test_migrate_legacy_flat_keys() {
        let file = write_temp_json(
            r#"{
            "LLM_MODEL_TYPE": "ollama",
            "LLM_MODEL": "llama3",
            "LLM_API_URL": "http://127.0.0.1:11434"
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.api_base.as_deref(), Some("http://127.0.0.1:11434"));
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let mut raw = serde_json::json!({
            "LLM_MODEL_TYPE": "ollama",
            "llm": { "provider": "claude" }
        });
        migrate_config(&mut raw);
        assert_eq!(raw["llm"]["provider"], "claude");
        assert!(raw.get("LLM_MODEL_TYPE").is_none());
    }

    #[test]
    fn test_migrate_ignores_non_object_root() {
        let mut raw = serde_json::json!([1, 2, 3]);
        migrate_config(&mut raw);
        assert_eq!(raw, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_env_override_temperature() {
        std::env::set_var("SCRIVENER_LLM__TEMPERATURE", "0.9");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.llm.temperature, 0.9);
        std::env::remove_var("SCRIVENER_LLM__TEMPERATURE");
    }

    #[test]
    fn test_env_override_retry_attempts() {
        std::env::set_var("SCRIVENER_RETRY__MAX_ATTEMPTS", "4");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.retry.max_attempts, 4);
        std::env::remove_var("SCRIVENER_RETRY__MAX_ATTEMPTS");
    }

    #[test]
    fn test_env_override_usage_log_enabled() {
        std::env::set_var("SCRIVENER_USAGE_LOG__ENABLED", "0");
        let config = apply_env_overrides(Config::default());
        assert!(!config.usage_log.enabled);
        std::env::remove_var("SCRIVENER_USAGE_LOG__ENABLED");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["retry"].get("baseDelayMs").is_some());
        assert!(raw["retry"].get("base_delay_ms").is_none());
    }
}
