//! Provider trait: the one capability every LLM backend exposes.
//!
//! Callers hold an `Arc<dyn ProviderModel>` and never branch on which
//! backend is behind it.

use async_trait::async_trait;
use scrivener_core::types::InvocationRequest;

use crate::error::ProviderError;
use crate::normalizer::RawResponse;

/// Sampling settings applied to every call a provider makes.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.4,
        }
    }
}

/// Trait that all LLM providers implement.
#[async_trait]
pub trait ProviderModel: Send + Sync {
    /// Send one request and return the provider-native response.
    ///
    /// Transport failures and HTTP error statuses are returned unmodified
    /// as [`ProviderError`]s; classifying them is the caller's job.
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse, ProviderError>;

    /// The model identifier this instance sends.
    fn model_name(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
