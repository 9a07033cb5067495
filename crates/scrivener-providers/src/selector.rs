//! Provider selection: map a configured type name plus credentials to a
//! ready-to-use [`ProviderModel`].
//!
//! Selection only builds an HTTP client; no request is sent until the
//! first `invoke`.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use scrivener_core::config::LlmConfig;

use crate::anthropic::ClaudeProvider;
use crate::error::ProviderError;
use crate::gemini::GeminiProvider;
use crate::http_provider::HttpProvider;
use crate::huggingface::HuggingFaceProvider;
use crate::ollama::OllamaProvider;
use crate::registry::{find_by_name, resolve_api_base, ProviderKind, ProviderSpec};
use crate::traits::{LlmRequestConfig, ProviderModel};

/// Default per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// API credentials for a provider.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Credentials {
            api_key: Some(api_key.into()),
        }
    }

    pub fn none() -> Self {
        Credentials::default()
    }

    /// The explicit key if non-blank, else the provider's conventional
    /// environment variable.
    fn resolve(&self, spec: &ProviderSpec) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .or_else(|| {
                spec.env_key
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.trim().is_empty())
            })
    }
}

/// Build a provider from a type name, credentials, model and optional base URL,
/// using default sampling settings and timeout.
pub fn select(
    provider_type: &str,
    credentials: &Credentials,
    model: &str,
    base_url: Option<&str>,
) -> Result<Arc<dyn ProviderModel>, ProviderError> {
    select_with(
        provider_type,
        credentials,
        model,
        base_url,
        LlmRequestConfig::default(),
        DEFAULT_TIMEOUT,
    )
}

/// Like [`select`], with explicit sampling settings and HTTP timeout.
pub fn select_with(
    provider_type: &str,
    credentials: &Credentials,
    model: &str,
    base_url: Option<&str>,
    config: LlmRequestConfig,
    timeout: Duration,
) -> Result<Arc<dyn ProviderModel>, ProviderError> {
    let spec = find_by_name(provider_type)
        .ok_or_else(|| ProviderError::UnsupportedProvider(provider_type.to_string()))?;

    let api_base = resolve_api_base(spec, base_url);
    let api_key = match credentials.resolve(spec) {
        Some(key) => key,
        None if spec.requires_api_key => {
            return Err(ProviderError::MissingCredentials {
                provider: spec.display_name,
                env_key: spec.env_key.unwrap_or("an API key"),
            })
        }
        None => String::new(),
    };

    debug!(
        provider = spec.display_name,
        model = model,
        api_base = %api_base,
        "Creating LLM provider"
    );

    let provider: Arc<dyn ProviderModel> = match spec.kind {
        ProviderKind::OpenAiCompatible | ProviderKind::Perplexity => Arc::new(HttpProvider::new(
            spec, api_base, api_key, model, config, timeout,
        )?),
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(
            api_base, api_key, model, config, timeout,
        )?),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(api_base, model, config, timeout)?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            api_base, api_key, model, config, timeout,
        )?),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceProvider::new(
            api_base, api_key, model, config, timeout,
        )?),
    };
    Ok(provider)
}

/// Build the provider described by the `llm` config section.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn ProviderModel>, ProviderError> {
    let credentials = if config.has_api_key() {
        Credentials::new(config.api_key.clone())
    } else {
        Credentials::none()
    };
    select_with(
        &config.provider,
        &credentials,
        &config.model,
        config.api_base.as_deref(),
        LlmRequestConfig {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        },
        Duration::from_secs(config.timeout_secs.max(1)),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_each_variant() {
        let creds = Credentials::new("k");
        for (name, display) in [
            ("openai-compatible", "OpenAI-compatible"),
            ("claude", "Claude"),
            ("ollama", "Ollama"),
            ("gemini", "Gemini"),
            ("huggingface", "HuggingFace"),
            ("perplexity", "Perplexity"),
        ] {
            let model = select(name, &creds, "some-model", None).unwrap();
            assert_eq!(model.display_name(), display);
            assert_eq!(model.model_name(), "some-model");
        }
    }

    #[test]
    fn test_select_alias() {
        let model = select("Anthropic", &Credentials::new("k"), "claude-3-5-haiku-latest", None)
            .unwrap();
        assert_eq!(model.display_name(), "Claude");
    }

    #[test]
    fn test_unsupported_type() {
        let err = select("bard", &Credentials::new("k"), "m", None).err().unwrap();
        assert!(matches!(err, ProviderError::UnsupportedProvider(ref s) if s == "bard"));
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let model = select("ollama", &Credentials::none(), "llama3.2", None).unwrap();
        assert_eq!(model.model_name(), "llama3.2");
    }

    #[test]
    fn test_blank_key_with_no_env_is_missing_credentials() {
        // Perplexity's env var is not set in CI
        if std::env::var("PERPLEXITY_API_KEY").is_ok() {
            return;
        }
        let err = select("perplexity", &Credentials::new("   "), "sonar", None).err().unwrap();
        assert!(matches!(
            err,
            ProviderError::MissingCredentials { env_key: "PERPLEXITY_API_KEY", .. }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_config_carries_settings() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key: "sk-test".to_string(),
            api_base: Some("http://localhost:1234/v1/".to_string()),
            ..LlmConfig::default()
        };
        let model = from_config(&config).unwrap();
        assert_eq!(model.model_name(), "gpt-4o");
        assert_eq!(model.display_name(), "OpenAI-compatible");
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let dbg = format!("{:?}", Credentials::new("sk-secret"));
        assert!(!dbg.contains("sk-secret"));
    }
}
