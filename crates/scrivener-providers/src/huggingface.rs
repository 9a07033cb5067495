//! HuggingFace Inference API: plain text generation.
//!
//! The endpoint takes one `inputs` string, so conversations are flattened
//! into a role-prefixed transcript ending with an open assistant turn.

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
struct GenerationRequest {
    inputs: String,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    temperature: f64,
    max_new_tokens: u32,
    return_full_text: bool,
}

pub struct HuggingFaceProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    config: LlmRequestConfig,
}

impl std::fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl HuggingFaceProvider {
    pub fn new(
        api_base: String,
        api_key: String,
        model: &str,
        config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(HuggingFaceProvider {
            client: build_client(timeout)?,
            api_base,
            api_key,
            model: model.to_string(),
            config,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.api_base.trim_end_matches('/'), self.model)
    }
}

/// Flatten a request into the single text input the endpoint expects.
/// A bare prompt is passed through untouched.
fn flatten(request: &InvocationRequest) -> String {
    match request {
        InvocationRequest::Prompt(text) => text.clone(),
        InvocationRequest::Messages(messages) => {
            let mut out = messages
                .iter()
                .map(|m: &Message| format!("{}: {}", m.role(), m.content()))
                .collect::<Vec<_>>()
                .join("\n");
            out.push_str("\nassistant:");
            out
        }
    }
}

#[async_trait]
impl ProviderModel for HuggingFaceProvider {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError> {
        debug!(model = %self.model, "Invoking HuggingFace inference");

        let body = GenerationRequest {
            inputs: flatten(request),
            parameters: GenerationParameters {
                temperature: self.config.temperature,
                max_new_tokens: self.config.max_tokens,
                return_full_text: false,
            },
        };

        let builder = self
            .client
            .post(self.model_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        let value = send_json(self.display_name(), builder).await?;
        Ok(RawResponse::HuggingFace(value))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        ProviderKind::HuggingFace.spec().display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(api_base: &str) -> HuggingFaceProvider {
        HuggingFaceProvider::new(
            api_base.to_string(),
            "hf_test".to_string(),
            "mistralai/Mistral-7B-Instruct-v0.3",
            LlmRequestConfig::default(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_flatten_prompt_passthrough() {
        assert_eq!(flatten(&"Write a haiku".into()), "Write a haiku");
    }

    #[test]
    fn test_flatten_conversation() {
        let request = InvocationRequest::messages(vec![
            Message::system("Be brief."),
            Message::user("Name a color."),
        ]);
        assert_eq!(
            flatten(&request),
            "system: Be brief.\nuser: Name a color.\nassistant:"
        );
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/mistralai/Mistral-7B-Instruct-v0.3"))
            .and(header("Authorization", "Bearer hf_test"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "Name a color.",
                "parameters": { "return_full_text": false, "max_new_tokens": 4096 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": " Blue." }])),
            )
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let reply = normalize(provider.invoke(&"Name a color.".into()).await.unwrap());
        assert_eq!(reply.content, " Blue.");
        assert!(reply.usage.is_zero());
    }

    #[tokio::test]
    async fn test_model_loading_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model is currently loading",
                "estimated_time": 20.0
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let err = provider.invoke(&"hi".into()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(503));
    }
}
