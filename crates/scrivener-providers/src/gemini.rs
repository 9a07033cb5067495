//! Gemini provider: Google `generateContent`.
//!
//! Gemini has no system or assistant roles in `contents`: system text goes
//! into `systemInstruction` and assistant turns use the `model` role.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use scrivener_core::types::{InvocationRequest, Message};

use crate::error::ProviderError;
use crate::http_provider::{build_client, send_json};
use crate::normalizer::RawResponse;
use crate::registry::ProviderKind;
use crate::traits::{LlmRequestConfig, ProviderModel};

/// Safety categories relaxed so short factual answers are not blocked.
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Client for the Gemini REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    config: LlmRequestConfig,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(
        api_base: String,
        api_key: String,
        model: &str,
        config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(GeminiProvider {
            client: build_client(timeout)?,
            api_base,
            api_key,
            model: model.to_string(),
            config,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn build_body(&self, request: &InvocationRequest) -> Value {
        let mut system = Vec::new();
        let mut contents = Vec::new();

        for message in request.to_messages() {
            match message {
                Message::System { content } => system.push(json!({ "text": content })),
                Message::User { content } => {
                    contents.push(json!({ "role": "user", "parts": [{ "text": content }] }))
                }
                Message::Assistant { content } => {
                    contents.push(json!({ "role": "model", "parts": [{ "text": content }] }))
                }
            }
        }

        let safety: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|c| json!({ "category": c, "threshold": "BLOCK_NONE" }))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
            },
            "safetySettings": safety,
        });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": system });
        }
        body
    }
}

#[async_trait]
impl ProviderModel for GeminiProvider {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError> {
        debug!(model = %self.model, messages = request.len(), "Invoking Gemini API");

        let builder = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_body(request));

        let value = send_json(self.display_name(), builder).await?;
        Ok(RawResponse::Gemini(value))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        ProviderKind::Gemini.spec().display_name
    }
}
