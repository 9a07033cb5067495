//! Provider registry: static specs for the six supported backends.
//!
//! Each `ProviderSpec` describes how to reach one backend: accepted type
//! names, the env var holding its key, and its default API base.

use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

// ─────────────────────────────────────────────
// ProviderKind
// ─────────────────────────────────────────────

/// The closed set of backends a config may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAiCompatible,
    Claude,
    Ollama,
    Gemini,
    HuggingFace,
    Perplexity,
}

impl ProviderKind {
    /// The static spec for this kind.
    pub fn spec(self) -> &'static ProviderSpec {
        // Indexes follow the order of `PROVIDERS`.
        let index = match self {
            ProviderKind::OpenAiCompatible => 0,
            ProviderKind::Claude => 1,
            ProviderKind::Ollama => 2,
            ProviderKind::Gemini => 3,
            ProviderKind::HuggingFace => 4,
            ProviderKind::Perplexity => 5,
        };
        &PROVIDERS[index]
    }

    /// Canonical config name (e.g. `"openai-compatible"`).
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        find_by_name(s)
            .map(|spec| spec.kind)
            .ok_or_else(|| ProviderError::UnsupportedProvider(s.to_string()))
    }
}

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static description of one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Canonical type name used in config files.
    pub name: &'static str,
    /// Other accepted spellings (lowercase).
    pub aliases: &'static [&'static str],
    /// Human-readable name for logs. E.g. `"Claude"`.
    pub display_name: &'static str,
    /// Conventional environment variable for the API key, if any.
    pub env_key: Option<&'static str>,
    /// API base used when the config does not set one.
    pub default_api_base: &'static str,
    /// Whether invoking without a key is a configuration error.
    pub requires_api_key: bool,
}

/// Every supported provider, in display order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::OpenAiCompatible,
        name: "openai-compatible",
        aliases: &["openai", "openai_compatible"],
        display_name: "OpenAI-compatible",
        env_key: Some("OPENAI_API_KEY"),
        default_api_base: "https://api.openai.com/v1",
        requires_api_key: true,
    },
    ProviderSpec {
        kind: ProviderKind::Claude,
        name: "claude",
        aliases: &["anthropic"],
        display_name: "Claude",
        env_key: Some("ANTHROPIC_API_KEY"),
        default_api_base: "https://api.anthropic.com",
        requires_api_key: true,
    },
    // Self-hosted; no key
    ProviderSpec {
        kind: ProviderKind::Ollama,
        name: "ollama",
        aliases: &[],
        display_name: "Ollama",
        env_key: None,
        default_api_base: "http://localhost:11434",
        requires_api_key: false,
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        aliases: &["google"],
        display_name: "Gemini",
        env_key: Some("GEMINI_API_KEY"),
        default_api_base: "https://generativelanguage.googleapis.com/v1beta",
        requires_api_key: true,
    },
    ProviderSpec {
        kind: ProviderKind::HuggingFace,
        name: "huggingface",
        aliases: &["hf", "hugging-face"],
        display_name: "HuggingFace",
        env_key: Some("HUGGINGFACEHUB_API_TOKEN"),
        default_api_base: "https://api-inference.huggingface.co",
        requires_api_key: true,
    },
    // OpenAI wire format, different host
    ProviderSpec {
        kind: ProviderKind::Perplexity,
        name: "perplexity",
        aliases: &["pplx"],
        display_name: "Perplexity",
        env_key: Some("PERPLEXITY_API_KEY"),
        default_api_base: "https://api.perplexity.ai",
        requires_api_key: true,
    },
];

// ─────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────

/// Find a provider spec by type name or alias (case-insensitive).
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    let name = name.trim().to_lowercase();
    PROVIDERS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name.as_str()))
}

/// Resolve the API base: a non-empty explicit URL wins over the spec default.
/// Trailing slashes are dropped so endpoint paths can be appended directly.
pub fn resolve_api_base(spec: &ProviderSpec, base_url: Option<&str>) -> String {
    base_url
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(spec.default_api_base)
        .trim_end_matches('/')
        .to_string()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
