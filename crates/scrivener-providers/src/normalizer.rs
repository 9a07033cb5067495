//! Response normalization: provider-native payloads into [`CanonicalReply`].
//!
//! Every field is read defensively: anything missing or of the wrong type
//! becomes the zero value, so a provider that sends bare text still yields
//! a complete reply.

use serde_json::Value;

use scrivener_core::types::{CanonicalReply, TokenUsage};

/// A provider-native result, tagged with the wire shape it came in.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResponse {
    /// `/chat/completions` body (OpenAI-compatible, Perplexity).
    OpenAi(Value),
    /// Anthropic `/v1/messages` body.
    Claude(Value),
    /// Ollama `/api/chat` body.
    Ollama(Value),
    /// Gemini `generateContent` body.
    Gemini(Value),
    /// HuggingFace text-generation body.
    HuggingFace(Value),
    /// Bare text with no metadata object at all.
    Text(String),
}

/// Convert a raw provider response into the canonical reply shape.
pub fn normalize(raw: RawResponse) -> CanonicalReply {
    match raw {
        RawResponse::OpenAi(body) => CanonicalReply {
            content: text_at(&body, "/choices/0/message/content"),
            model_name: text_at(&body, "/model"),
            finish_reason: text_at(&body, "/choices/0/finish_reason"),
            response_id: text_at(&body, "/id"),
            system_fingerprint: text_at(&body, "/system_fingerprint"),
            usage: TokenUsage::new(
                count_at(&body, "/usage/prompt_tokens"),
                count_at(&body, "/usage/completion_tokens"),
                count_at(&body, "/usage/total_tokens"),
            ),
        },
        RawResponse::Claude(body) => CanonicalReply {
            content: joined_text(body.get("content"), "/text"),
            model_name: text_at(&body, "/model"),
            finish_reason: text_at(&body, "/stop_reason"),
            response_id: text_at(&body, "/id"),
            system_fingerprint: String::new(),
            usage: TokenUsage::new(
                count_at(&body, "/usage/input_tokens"),
                count_at(&body, "/usage/output_tokens"),
                count_at(&body, "/usage/total_tokens"),
            ),
        },
        RawResponse::Ollama(body) => CanonicalReply {
            content: text_at(&body, "/message/content"),
            model_name: text_at(&body, "/model"),
            finish_reason: text_at(&body, "/done_reason"),
            response_id: String::new(),
            system_fingerprint: String::new(),
            usage: TokenUsage::new(
                count_at(&body, "/prompt_eval_count"),
                count_at(&body, "/eval_count"),
                0,
            ),
        },
        RawResponse::Gemini(body) => CanonicalReply {
            content: joined_text(body.pointer("/candidates/0/content/parts"), "/text"),
            model_name: text_at(&body, "/modelVersion"),
            finish_reason: text_at(&body, "/candidates/0/finishReason"),
            response_id: text_at(&body, "/responseId"),
            system_fingerprint: String::new(),
            usage: TokenUsage::new(
                count_at(&body, "/usageMetadata/promptTokenCount"),
                count_at(&body, "/usageMetadata/candidatesTokenCount"),
                count_at(&body, "/usageMetadata/totalTokenCount"),
            ),
        },
        RawResponse::HuggingFace(body) => {
            // Either `[{"generated_text": ...}]` or a bare object.
            let content = body
                .pointer("/0/generated_text")
                .or_else(|| body.get("generated_text"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            CanonicalReply::text(content)
        }
        RawResponse::Text(text) => CanonicalReply::text(text),
    }
}

/// String at a JSON pointer, or empty.
fn text_at(body: &Value, pointer: &str) -> String {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Non-negative integer at a JSON pointer, or zero.
fn count_at(body: &Value, pointer: &str) -> u64 {
    body.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

/// Concatenate the string at `pointer` inside every element of an array.
fn joined_text(blocks: Option<&Value>, pointer: &str) -> String {
    blocks
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.pointer(pointer).and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
