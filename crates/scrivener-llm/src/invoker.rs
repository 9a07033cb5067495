//! Resilient invocation: bounded retry with exponential backoff.
//!
//! ```text
//! Idle ─▶ Attempting ──ok──────────────▶ Success
//!             │ ▲
//!   retryable │ │ delay elapsed
//!             ▼ │
//!          Retrying ──budget spent──▶ FatalFailure
//!             │
//!   fatal ────┴────────────────────────▶ FatalFailure
//! ```
//!
//! Both suspension points (the provider call and the backoff sleep) race a
//! [`CancellationToken`]; cancelling yields [`InvokeError::Cancelled`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use scrivener_core::config::RetryConfig;
use scrivener_core::types::{CanonicalReply, InvocationRequest};
use scrivener_providers::{normalize, ProviderError, ProviderModel};

use crate::sanitizer::sanitize;
use crate::usage_log::{UsageLogEntry, UsageSink};

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Terminal failure of one resilient invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// A failure retrying cannot fix (bad credentials, rejected request).
    #[error("LLM call failed: {0}")]
    Fatal(#[source] ProviderError),

    /// Every attempt failed with a transient error.
    #[error("LLM call failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last_error: ProviderError,
    },

    /// The caller cancelled before a reply arrived.
    #[error("LLM call cancelled")]
    Cancelled,
}

// ─────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────

/// How many times to try and how long to wait in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub base_delay: Duration,
    /// Ceiling for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay,
            ..RetryPolicy::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Attempts actually made before giving up.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Progress through one invocation. Never outlives the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RetryState {
    /// Attempts made so far.
    attempt: u32,
    /// Wait before the next attempt.
    delay: Duration,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        RetryState {
            attempt: 0,
            delay: policy.delay_for(0),
        }
    }

    fn advance(&mut self, policy: &RetryPolicy) {
        self.delay = policy.delay_for(self.attempt);
    }
}

// ─────────────────────────────────────────────
// Invoker
// ─────────────────────────────────────────────

/// Wraps provider calls with retry, normalization, sanitizing and usage
/// logging. Holds no per-call state, so one instance can serve concurrent
/// callers.
#[derive(Clone)]
pub struct ResilientInvoker {
    policy: RetryPolicy,
    sink: Arc<dyn UsageSink>,
}

impl std::fmt::Debug for ResilientInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientInvoker {
    pub fn new(policy: RetryPolicy, sink: Arc<dyn UsageSink>) -> Self {
        ResilientInvoker { policy, sink }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `model` until it succeeds, fails fatally, runs out of
    /// attempts, or `cancel` fires.
    ///
    /// On success the reply is normalized, logged as received, and returned
    /// with sanitized content. The request is sent unchanged on every
    /// attempt.
    pub async fn invoke_with_retry(
        &self,
        model: &dyn ProviderModel,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<CanonicalReply, InvokeError> {
        if cancel.is_cancelled() {
            return Err(InvokeError::Cancelled);
        }

        let budget = self.policy.attempt_budget();
        let mut state = RetryState::new(&self.policy);

        loop {
            state.attempt += 1;
            debug!(
                provider = model.display_name(),
                model = model.model_name(),
                attempt = state.attempt,
                max_attempts = budget,
                "Invoking LLM"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt = state.attempt, "LLM call cancelled in flight");
                    return Err(InvokeError::Cancelled);
                }
                result = model.invoke(request) => result,
            };

            let err = match outcome {
                Ok(raw) => return Ok(self.complete(model, request, normalize(raw))),
                Err(e) => e,
            };

            if !err.is_retryable() {
                error!(
                    provider = model.display_name(),
                    attempt = state.attempt,
                    error = %err,
                    "LLM call failed with a non-retryable error"
                );
                return Err(InvokeError::Fatal(err));
            }

            if state.attempt >= budget {
                error!(
                    provider = model.display_name(),
                    attempts = state.attempt,
                    error = %err,
                    "LLM call failed, retry budget exhausted"
                );
                return Err(InvokeError::RetryExhausted {
                    attempts: state.attempt,
                    last_error: err,
                });
            }

            warn!(
                provider = model.display_name(),
                attempt = state.attempt,
                max_attempts = budget,
                delay_ms = state.delay.as_millis() as u64,
                error = %err,
                "LLM call failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt = state.attempt, "LLM call cancelled during backoff");
                    return Err(InvokeError::Cancelled);
                }
                _ = tokio::time::sleep(state.delay) => {}
            }
            state.advance(&self.policy);
        }
    }

    /// Success path: log the reply as received, hand back sanitized text.
    fn complete(
        &self,
        model: &dyn ProviderModel,
        request: &InvocationRequest,
        reply: CanonicalReply,
    ) -> CanonicalReply {
        let entry = UsageLogEntry::new(model.model_name(), request, &reply, &self.sink.pricing());
        self.sink.record(&entry);

        debug!(
            provider = model.display_name(),
            finish_reason = %reply.finish_reason,
            total_tokens = reply.usage.total_tokens,
            "LLM call succeeded"
        );

        CanonicalReply {
            content: sanitize(&reply.content),
            ..reply
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
