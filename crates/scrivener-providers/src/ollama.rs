//! Ollama provider: self-hosted `/api/chat`, no authentication.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use scrivener_core::types::{InvocationRequest, Message};

use crate::error::ProviderError;
use crate::http_provider::{build_client, send_json};
use crate::normalizer::RawResponse;
use crate::registry::ProviderKind;
use crate::traits::{LlmRequestConfig, ProviderModel};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
}

/// Client for a local or remote Ollama server.
#[derive(Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    api_base: String,
    model: String,
    config: LlmRequestConfig,
}

impl OllamaProvider {
    pub fn new(
        api_base: String,
        model: &str,
        config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        debug!(api_base = %api_base, "Using Ollama");
        Ok(OllamaProvider {
            client: build_client(timeout)?,
            api_base,
            model: model.to_string(),
            config,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProviderModel for OllamaProvider {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: request.to_messages(),
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let builder = self.client.post(self.chat_url()).json(&body);
        let value = send_json(self.display_name(), builder).await?;
        Ok(RawResponse::Ollama(value))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        ProviderKind::Ollama.spec().display_name
    }
}
