//! Per-call usage log: one JSON object per line, append-only.
//!
//! Logging is best-effort. A missing destination turns every call into a
//! no-op, and I/O failures are reported through `tracing` and swallowed so
//! the reply still reaches the caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scrivener_core::config::UsageLogConfig;
use scrivener_core::types::{CanonicalReply, InvocationRequest};
use scrivener_core::utils::log_timestamp;

// ─────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────

/// One line of the usage log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub model: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub time: String,
    /// A plain string for single prompts, `{"prompt_1": ..}` for conversations.
    pub prompts: serde_json::Value,
    pub replies: String,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}

impl UsageLogEntry {
    /// Build an entry for a completed call, stamped with the current time.
    ///
    /// `reply` is the normalized reply before sanitizing.
    pub fn new(
        model: &str,
        request: &InvocationRequest,
        reply: &CanonicalReply,
        pricing: &Pricing,
    ) -> Self {
        let model = if reply.model_name.is_empty() {
            model.to_string()
        } else {
            reply.model_name.clone()
        };
        UsageLogEntry {
            model,
            time: log_timestamp(),
            prompts: request.prompt_log(),
            replies: reply.content.clone(),
            total_tokens: reply.usage.total_tokens,
            input_tokens: reply.usage.input_tokens,
            output_tokens: reply.usage.output_tokens,
            total_cost: pricing.cost(reply.usage.input_tokens, reply.usage.output_tokens),
        }
    }
}

// ─────────────────────────────────────────────
// Pricing
// ─────────────────────────────────────────────

/// Fixed per-token prices used for the cost estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pricing {
    pub per_input_token: f64,
    pub per_output_token: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing::from(&UsageLogConfig::default())
    }
}

impl From<&UsageLogConfig> for Pricing {
    fn from(config: &UsageLogConfig) -> Self {
        Pricing {
            per_input_token: config.price_per_input_token,
            per_output_token: config.price_per_output_token,
        }
    }
}

impl Pricing {
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 * self.per_input_token + output_tokens as f64 * self.per_output_token
    }
}

// ─────────────────────────────────────────────
// Sink
// ─────────────────────────────────────────────

/// Destination for usage records. Implementations must not fail the caller.
pub trait UsageSink: Send + Sync {
    fn record(&self, entry: &UsageLogEntry);

    /// Prices applied when building entries for this sink.
    fn pricing(&self) -> Pricing {
        Pricing::default()
    }
}

/// JSON-lines file sink. Concurrent writers are serialized per record.
pub struct UsageLogger {
    path: Option<PathBuf>,
    pricing: Pricing,
    lock: Mutex<()>,
}

impl std::fmt::Debug for UsageLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLogger")
            .field("path", &self.path)
            .field("pricing", &self.pricing)
            .finish()
    }
}

impl UsageLogger {
    pub fn new(path: impl Into<PathBuf>, pricing: Pricing) -> Self {
        UsageLogger {
            path: Some(path.into()),
            pricing,
            lock: Mutex::new(()),
        }
    }

    /// A logger with no destination; every record is dropped.
    pub fn disabled() -> Self {
        UsageLogger {
            path: None,
            pricing: Pricing::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &UsageLogConfig) -> Self {
        match config.destination() {
            Some(path) => UsageLogger::new(path, Pricing::from(config)),
            None => UsageLogger {
                pricing: Pricing::from(config),
                ..UsageLogger::disabled()
            },
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn append(path: &Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl UsageSink for UsageLogger {
    fn record(&self, entry: &UsageLogEntry) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        let mut line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize usage record");
                return;
            }
        };
        line.push('\n');

        // A poisoned lock only means another writer panicked mid-append;
        // the file itself is still usable.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match Self::append(path, &line) {
            Ok(()) => debug!(
                path = %path.display(),
                model = %entry.model,
                total_cost = entry.total_cost,
                "Usage logged"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write usage log"),
        }
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::types::{Message, TokenUsage};
    use std::sync::Arc;

    fn sample_reply(input: u64, output: u64) -> CanonicalReply {
        CanonicalReply {
            content: "**Done**".to_string(),
            model_name: "gpt-4o-mini-2024-07-18".to_string(),
            usage: TokenUsage::new(input, output, input + output),
            ..CanonicalReply::default()
        }
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_cost() {
        let pricing = Pricing::default();
        let cost = pricing.cost(1000, 500);
        assert!((cost - (1000.0 * 0.000_000_15 + 500.0 * 0.000_000_6)).abs() < 1e-12);
        assert_eq!(pricing.cost(0, 0), 0.0);
    }

    #[test]
    fn test_entry_fields() {
        let entry = UsageLogEntry::new(
            "gpt-4o-mini",
            &"Summarize this".into(),
            &sample_reply(10, 5),
            &Pricing::default(),
        );
        assert_eq!(entry.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(entry.prompts, serde_json::json!("Summarize this"));
        assert_eq!(entry.replies, "**Done**");
        assert_eq!(entry.total_tokens, 15);
        assert_eq!(entry.time.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn test_entry_without_usage_costs_nothing() {
        let reply = CanonicalReply::text("ok");
        let entry = UsageLogEntry::new("llama3.2", &"hi".into(), &reply, &Pricing::default());
        assert_eq!(entry.model, "llama3.2");
        assert_eq!(entry.total_cost, 0.0);
        assert_eq!(entry.input_tokens, 0);
    }

    #[test]
    fn test_conversation_prompts_keyed() {
        let request = InvocationRequest::messages(vec![
            Message::system("You are a recruiter."),
            Message::user("Rate me."),
        ]);
        let entry =
            UsageLogEntry::new("m", &request, &sample_reply(1, 1), &Pricing::default());
        assert_eq!(
            entry.prompts,
            serde_json::json!({ "prompt_1": "You are a recruiter.", "prompt_2": "Rate me." })
        );
    }

    #[test]
    fn test_disabled_is_noop() {
        let logger = UsageLogger::disabled();
        assert!(logger.path().is_none());
        let entry = UsageLogEntry::new("m", &"p".into(), &sample_reply(1, 1), &Pricing::default());
        logger.record(&entry);
    }

    #[test]
    fn test_from_config_disabled_or_blank() {
        let config = UsageLogConfig {
            enabled: false,
            ..UsageLogConfig::default()
        };
        assert!(UsageLogger::from_config(&config).path().is_none());

        let config = UsageLogConfig {
            path: "  ".to_string(),
            ..UsageLogConfig::default()
        };
        assert!(UsageLogger::from_config(&config).path().is_none());
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("llm_calls.jsonl");
        let logger = UsageLogger::new(&path, Pricing::default());

        let entry = UsageLogEntry::new("m", &"first".into(), &sample_reply(3, 2), &logger.pricing());
        logger.record(&entry);
        let entry = UsageLogEntry::new("m", &"second".into(), &sample_reply(4, 1), &logger.pricing());
        logger.record(&entry);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["prompts"], "first");
        assert_eq!(lines[1]["prompts"], "second");
        assert_eq!(lines[1]["input_tokens"], 4);
        for key in [
            "model",
            "time",
            "prompts",
            "replies",
            "total_tokens",
            "input_tokens",
            "output_tokens",
            "total_cost",
        ] {
            assert!(lines[0].get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_existing_lines_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");
        fs::write(&path, "{\"model\":\"old\"}\n").unwrap();

        let logger = UsageLogger::new(&path, Pricing::default());
        logger.record(&UsageLogEntry::new(
            "new",
            &"p".into(),
            &CanonicalReply::text("r"),
            &Pricing::default(),
        ));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["model"], "old");
        assert_eq!(lines[1]["model"], "new");
    }

    #[test]
    fn test_unwritable_destination_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let logger = UsageLogger::new(dir.path(), Pricing::default());
        logger.record(&UsageLogEntry::new(
            "m",
            &"p".into(),
            &CanonicalReply::text("r"),
            &Pricing::default(),
        ));
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");
        let logger = Arc::new(UsageLogger::new(&path, Pricing::default()));
        let long_reply = "x".repeat(64 * 1024);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let logger = Arc::clone(&logger);
                let reply = CanonicalReply::text(long_reply.clone());
                std::thread::spawn(move || {
                    for j in 0..5 {
                        let prompt = format!("worker-{}-{}", i, j);
                        logger.record(&UsageLogEntry::new(
                            "m",
                            &prompt.into(),
                            &reply,
                            &Pricing::default(),
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 40);
        assert!(lines
            .iter()
            .all(|l| l["replies"].as_str().map(str::len) == Some(64 * 1024)));
    }
}
