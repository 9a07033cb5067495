//! Core types for Scrivener: the request and reply shapes shared by every
//! LLM provider and by the resilience layer on top of them.
//!
//! Requests are built once by prompt code and never mutated afterwards, so
//! the same `InvocationRequest` can be replayed verbatim on every retry.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// A role-tagged chat message.
///
/// Serializes to the `{"role": "...", "content": "..."}` shape that the
/// OpenAI-compatible, Claude and Ollama APIs all accept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant { content: String },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    /// The wire role name (`"system"`, `"user"`, `"assistant"`).
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
        }
    }

    /// The text content of the message.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content } => content,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }
}

// ─────────────────────────────────────────────
// Invocation request
// ─────────────────────────────────────────────

/// What gets sent to a provider: either one prompt string or an ordered
/// conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationRequest {
    Prompt(String),
    Messages(Vec<Message>),
}

impl InvocationRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        InvocationRequest::Prompt(text.into())
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        InvocationRequest::Messages(messages)
    }

    /// The request as a message list. A bare prompt becomes one user message.
    pub fn to_messages(&self) -> Vec<Message> {
        match self {
            InvocationRequest::Prompt(text) => vec![Message::user(text.as_str())],
            InvocationRequest::Messages(messages) => messages.clone(),
        }
    }

    /// Number of messages this request expands to.
    pub fn len(&self) -> usize {
        match self {
            InvocationRequest::Prompt(_) => 1,
            InvocationRequest::Messages(messages) => messages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the request for the usage log.
    ///
    /// A prompt is logged as a plain string; a conversation is logged as
    /// `{"prompt_1": "...", "prompt_2": "...", ...}` in message order.
    pub fn prompt_log(&self) -> serde_json::Value {
        match self {
            InvocationRequest::Prompt(text) => serde_json::Value::String(text.clone()),
            InvocationRequest::Messages(messages) => {
                let map = messages
                    .iter()
                    .enumerate()
                    .map(|(i, m)| {
                        (
                            format!("prompt_{}", i + 1),
                            serde_json::Value::String(m.content().to_string()),
                        )
                    })
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(map)
            }
        }
    }
}

impl From<&str> for InvocationRequest {
    fn from(text: &str) -> Self {
        InvocationRequest::Prompt(text.to_string())
    }
}

impl From<String> for InvocationRequest {
    fn from(text: String) -> Self {
        InvocationRequest::Prompt(text)
    }
}

impl From<Vec<Message>> for InvocationRequest {
    fn from(messages: Vec<Message>) -> Self {
        InvocationRequest::Messages(messages)
    }
}

// ─────────────────────────────────────────────
// Canonical reply
// ─────────────────────────────────────────────

/// Token counts reported by a provider.
///
/// All zero when the provider does not report usage. Totals are stored as
/// reported; `total_tokens` is not forced to equal `input + output`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: u64) -> Self {
        TokenUsage {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Whether the provider reported nothing at all.
    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0 && self.total_tokens == 0
    }
}

/// Provider-agnostic result of one successful invocation.
///
/// `content` is always present (empty string if the provider sent none);
/// every metadata field falls back to its zero value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalReply {
    pub content: String,
    pub model_name: String,
    pub finish_reason: String,
    pub response_id: String,
    pub system_fingerprint: String,
    pub usage: TokenUsage,
}

impl CanonicalReply {
    /// A reply carrying only text, with every metadata field zeroed.
    pub fn text(content: impl Into<String>) -> Self {
        CanonicalReply {
            content: content.into(),
            ..Default::default()
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
