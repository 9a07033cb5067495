//! Provider error taxonomy and the shared HTTP status classifier.
//!
//! Every variant maps HTTP failures through [`ProviderError::from_status`],
//! so retry decisions never depend on which backend answered.

use scrivener_core::utils::truncate_string;
use thiserror::Error;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Error type for provider construction and invocation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The configured provider type is not one we know how to build.
    #[error("unsupported provider type '{0}' (expected one of: openai-compatible, claude, ollama, gemini, huggingface, perplexity)")]
    UnsupportedProvider(String),

    /// The provider needs an API key and none was configured.
    #[error("missing API key for {provider}: set llm.apiKey or {env_key}")]
    MissingCredentials {
        provider: &'static str,
        env_key: &'static str,
    },

    /// HTTP 401/403.
    #[error("authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// HTTP 429.
    #[error("rate limited (HTTP 429): {message}")]
    RateLimited { message: String },

    /// HTTP 5xx and 408.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status (bad model name, malformed request, ...).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Connection, timeout, or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered 2xx with a body we could not parse.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_error_message(body);
        match status {
            401 | 403 => ProviderError::Auth { status, message },
            429 => ProviderError::RateLimited { message },
            408 | 500..=599 => ProviderError::Server { status, message },
            _ => ProviderError::Rejected { status, message },
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Rate limits, server errors, transport failures and malformed bodies
    /// are transient; configuration, authentication and rejected requests
    /// are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Server { .. }
                | ProviderError::Transport(_)
                | ProviderError::Decode(_)
        )
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Auth { status, .. }
            | ProviderError::Server { status, .. }
            | ProviderError::Rejected { status, .. } => Some(*status),
            ProviderError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else if err.is_timeout() {
            ProviderError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            ProviderError::Transport(format!("connection failed: {}", err))
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Understands `{"error": {"message": ...}}` (OpenAI, Claude, Gemini),
/// `{"error": "..."}` (Ollama, HuggingFace) and `{"message": ...}`;
/// anything else is returned as (truncated) raw text.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let found = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str());
        if let Some(msg) = found {
            return msg.to_string();
        }
    }
    truncate_string(body.trim(), MAX_ERROR_BODY)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
