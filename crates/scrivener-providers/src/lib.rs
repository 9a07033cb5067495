//! LLM provider layer for Scrivener.
//!
//! # Architecture
//!
//! - [`traits::ProviderModel`]: trait that all providers implement
//! - [`registry`]: static specs for the six supported backends
//! - [`selector::select`]: build a provider from a type name + credentials
//! - [`normalizer::normalize`]: provider-native payload → `CanonicalReply`
//! - [`error::ProviderError`]: shared failure taxonomy with retry classification

pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod http_provider;
pub mod huggingface;
pub mod normalizer;
pub mod ollama;
pub mod registry;
pub mod selector;
pub mod traits;

// Re-export main types for convenience
pub use error::ProviderError;
pub use normalizer::{normalize, RawResponse};
pub use registry::{ProviderKind, ProviderSpec, PROVIDERS};
pub use selector::{from_config, select, select_with, Credentials};
pub use traits::{LlmRequestConfig, ProviderModel};
