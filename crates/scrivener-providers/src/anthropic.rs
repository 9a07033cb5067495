//! Claude provider: Anthropic Messages API (`/v1/messages`).

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

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

/// Client for the Anthropic Messages API.
pub struct ClaudeProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    config: LlmRequestConfig,
}

impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl ClaudeProvider {
    pub fn new(
        api_base: String,
        api_key: String,
        model: &str,
        config: LlmRequestConfig,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(ClaudeProvider {
            client: build_client(timeout)?,
            api_base,
            api_key,
            model: model.to_string(),
            config,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }

    /// The Messages API takes system text as a top-level field, not a turn.
    fn build_body(&self, request: &InvocationRequest) -> MessagesRequest<'_> {
        let (system, turns): (Vec<Message>, Vec<Message>) =
            request.to_messages().into_iter().partition(Message::is_system);

        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .iter()
                    .map(Message::content)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };

        MessagesRequest {
            model: &self.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system,
            messages: turns,
        }
    }
}

#[async_trait]
impl ProviderModel for ClaudeProvider {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError> {
        debug!(model = %self.model, messages = request.len(), "Invoking Claude API");

        let builder = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_body(request));

        let value = send_json(self.display_name(), builder).await?;
        Ok(RawResponse::Claude(value))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        ProviderKind::Claude.spec().display_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(api_base: &str) -> ClaudeProvider {
        ClaudeProvider::new(
            api_base.to_string(),
            "sk-ant-test".to_string(),
            "claude-3-5-haiku-latest",
            LlmRequestConfig::default(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_system_messages_lifted() {
        let provider = make_provider("https://api.anthropic.com");
        let request = InvocationRequest::messages(vec![
            Message::system("You are a recruiter."),
            Message::system("Answer briefly."),
            Message::user("Rate this resume."),
        ]);
        let body = provider.build_body(&request);
        assert_eq!(body.system.as_deref(), Some("You are a recruiter.\n\nAnswer briefly."));
        assert_eq!(body.messages, vec![Message::user("Rate this resume.")]);
    }

    #[test]
    fn test_no_system_field_for_plain_prompt() {
        let provider = make_provider("https://api.anthropic.com");
        let body = provider.build_body(&"hi".into());
        assert!(body.system.is_none());
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-3-5-haiku-latest",
                "messages": [{"role": "user", "content": "Summarize"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_123",
                "type": "message",
                "role": "assistant",
                "model": "claude-3-5-haiku-20241022",
                "content": [{ "type": "text", "text": "A short summary." }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 9, "output_tokens": 4 }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let reply = normalize(provider.invoke(&"Summarize".into()).await.unwrap());

        assert_eq!(reply.content, "A short summary.");
        assert_eq!(reply.usage.input_tokens, 9);
        assert_eq!(reply.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn test_overloaded_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri());
        let err = provider.invoke(&"hi".into()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Server { status: 529, ref message } if message == "Overloaded"));
    }
}
