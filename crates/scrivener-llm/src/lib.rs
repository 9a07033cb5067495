//! LLM invocation layer for Scrivener.
//!
//! - [`invoker::ResilientInvoker`]: bounded retry + backoff, cancellable
//! - [`sanitizer::sanitize`]: markdown-ish output → consistent HTML-ish text
//! - [`usage_log::UsageLogger`]: append-only JSON-lines cost log
//! - [`matcher::best_match`]: snap free text onto a fixed option set
//! - [`answerer::Answerer`]: task-level prompts over all of the above

pub mod answerer;
pub mod invoker;
pub mod matcher;
pub mod sanitizer;
pub mod usage_log;

pub use answerer::{clean_llm_output, AnswerError, Answerer};
pub use invoker::{InvokeError, ResilientInvoker, RetryPolicy};
pub use matcher::best_match;
pub use sanitizer::sanitize;
pub use usage_log::{Pricing, UsageLogEntry, UsageLogger, UsageSink};

// Re-exported so callers need not depend on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
