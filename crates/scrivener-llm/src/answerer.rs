//! Application-facing facade: the prompts the document builders need,
//! all routed through one [`ResilientInvoker`].

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use scrivener_core::types::{InvocationRequest, Message};
use scrivener_providers::ProviderModel;

use crate::invoker::{InvokeError, ResilientInvoker};
use crate::matcher::best_match;

const SUMMARIZE_SYSTEM: &str = "You are an expert recruiter. You read job postings and \
summarize them for a candidate preparing an application.";

const SUMMARIZE_TEMPLATE: &str = "Summarize the job description below. Keep the role, \
seniority, responsibilities, required and preferred skills, and any details about \
location, compensation or visa sponsorship. Leave out boilerplate about the company \
and equal-opportunity statements. Answer in plain prose without headings.

Job description:
{text}";

const OPTIONS_TEMPLATE: &str = "Answer the question below by choosing exactly one of the \
listed options. Reply with the option text only.

Question: {question}

Options:
{options}";

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("no answer options supplied")]
    NoOptions,

    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

/// Drop markdown residue (`*`, `#`) from plain-text answers and trim.
pub fn clean_llm_output(output: &str) -> String {
    output.replace(['*', '#'], "").trim().to_string()
}

/// Task-level prompts over one provider.
#[derive(Clone)]
pub struct Answerer {
    model: Arc<dyn ProviderModel>,
    invoker: ResilientInvoker,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Answerer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Answerer")
            .field("model", &self.model.model_name())
            .field("invoker", &self.invoker)
            .finish()
    }
}

impl Answerer {
    pub fn new(model: Arc<dyn ProviderModel>, invoker: ResilientInvoker) -> Self {
        Answerer {
            model,
            invoker,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation token so an outside signal can abort calls.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn model(&self) -> &dyn ProviderModel {
        self.model.as_ref()
    }

    /// One resilient call; returns sanitized text.
    pub async fn ask(&self, request: impl Into<InvocationRequest>) -> Result<String, AnswerError> {
        let request = request.into();
        let reply = self
            .invoker
            .invoke_with_retry(self.model.as_ref(), &request, &self.cancel)
            .await?;
        Ok(reply.content)
    }

    /// Condense a scraped job description into a plain-text summary.
    pub async fn summarize_job_description(&self, text: &str) -> Result<String, AnswerError> {
        let request = InvocationRequest::messages(vec![
            Message::system(SUMMARIZE_SYSTEM),
            Message::user(SUMMARIZE_TEMPLATE.replace("{text}", text.trim())),
        ]);
        let summary = self.ask(request).await?;
        Ok(clean_llm_output(&summary))
    }

    /// Ask a multiple-choice question and snap the reply onto one option.
    pub async fn answer_from_options<S: AsRef<str>>(
        &self,
        question: &str,
        options: &[S],
    ) -> Result<String, AnswerError> {
        if options.is_empty() {
            return Err(AnswerError::NoOptions);
        }

        let listed = options
            .iter()
            .map(|o| format!("- {}", o.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = OPTIONS_TEMPLATE
            .replace("{question}", question.trim())
            .replace("{options}", &listed);

        let reply = self.ask(prompt).await?;
        let chosen = best_match(&clean_llm_output(&reply), options).ok_or(AnswerError::NoOptions)?;
        debug!(reply = %reply, chosen = chosen, "Matched answer to option");
        Ok(chosen.to_string())
    }
}
