//! Scrivener core: request/reply types, configuration, and shared helpers.

pub mod config;
pub mod types;
pub mod utils;

pub use types::{CanonicalReply, InvocationRequest, Message, TokenUsage};
