//! Configuration schema.
//!
//! Hierarchy: `Config` → `LlmConfig`, `RetryConfig`, `UsageLogConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.scrivener/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub usage_log: UsageLogConfig,
}

// ─────────────────────────────────────────────
// LLM backend
// ─────────────────────────────────────────────

/// Which backend to talk to and how.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    /// Provider type: `openai-compatible`, `claude`, `ollama`, `gemini`,
    /// `huggingface` or `perplexity`.
    pub provider: String,
    /// Model identifier sent to the provider.
    pub model: String,
    /// API key. Empty = fall back to the provider's conventional env var.
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            api_base: None,
            temperature: 0.4,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Whether an API key is set in the config itself.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Retry policy
// ─────────────────────────────────────────────

/// Bounded exponential backoff settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles every round.
    pub base_delay_ms: u64,
    /// Ceiling for any single delay.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            base_delay_ms: 10_000,
            max_delay_ms: 300_000,
        }
    }
}

// ─────────────────────────────────────────────
// Usage log
// ─────────────────────────────────────────────

/// Where per-call usage records go and how they are priced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageLogConfig {
    pub enabled: bool,
    /// JSON-lines file; `~` is expanded. Empty = no destination.
    pub path: String,
    pub price_per_input_token: f64,
    pub price_per_output_token: f64,
}

impl Default for UsageLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.scrivener/output/llm_calls.jsonl".to_string(),
            price_per_input_token: 0.000_000_15,
            price_per_output_token: 0.000_000_6,
        }
    }
}

impl UsageLogConfig {
    /// The resolved log file, or `None` when logging is off or unset.
    pub fn destination(&self) -> Option<std::path::PathBuf> {
        if !self.enabled || self.path.trim().is_empty() {
            return None;
        }
        Some(crate::utils::expand_home(self.path.trim()))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
