//! OpenAI-compatible HTTP provider, plus the request plumbing every
//! variant shares.
//!
//! Talks to any `/chat/completions` endpoint: OpenAI itself, DeepSeek,
//! OpenRouter, LM Studio, and Perplexity (same wire format, other host).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use scrivener_core::types::{InvocationRequest, Message};

use crate::error::ProviderError;
use crate::normalizer::RawResponse;
use crate::registry::ProviderSpec;
use crate::traits::{LlmRequestConfig, ProviderModel};

// ─────────────────────────────────────────────
// Shared plumbing
// ─────────────────────────────────────────────

/// Build the pooled HTTP client a provider keeps for its lifetime.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

/// Send a prepared request and return the JSON body of a 2xx response.
///
/// Non-success statuses go through [`ProviderError::from_status`].
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = %e, "HTTP request failed");
        ProviderError::from(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        error!(provider, status = %status, body = %body, "API error");
        return Err(ProviderError::from_status(status.as_u16(), &body));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!(provider, error = %e, "Failed to parse LLM response");
        ProviderError::Decode(e.to_string())
    })
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// A provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    config: LlmRequestConfig,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new provider against an already-resolved API base.
    pub fn new(
        spec: &'static ProviderSpec,
        api_base: String,
        api_key: String,
        model: &str,
        config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(HttpProvider {
            client: build_client(timeout)?,
            api_base,
            api_key,
            model: model.to_string(),
            config,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProviderModel for HttpProvider {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError> {
        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            messages = request.len(),
            "Calling LLM"
        );

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request.to_messages(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        let value = send_json(self.spec.display_name, builder).await?;
        Ok(RawResponse::OpenAi(value))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
