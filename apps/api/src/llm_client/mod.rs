//! Client layer for the generative model API.
//!
//! ARCHITECTURAL RULE: no other module talks to the model API directly.
//! Every call goes through `LlmClient`, which owns the retry policy, and
//! through the `GenerativeModel` trait, which keeps the transport swappable
//! (the production transport is `gemini::GeminiClient`; tests drive the
//! client with scripted fakes).

pub mod gemini;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::config::RetryPolicy;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The API said "too many requests". The only error the client retries.
    #[error("rate limited by the model API")]
    RateLimited,

    #[error("rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Structured output that did not parse. Fatal: asking the model again
    /// is not expected to turn prose into the requested JSON.
    #[error("model reply was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model reply contained no text")]
    EmptyReply,
}

/// The raw transport: submit one prompt, get the reply text back.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Retrying wrapper around a `GenerativeModel`.
///
/// Only rate limiting is retried, with a fixed pause between attempts;
/// every other failure surfaces immediately. The client keeps no state
/// between invocations.
#[derive(Clone)]
pub struct LlmClient {
    model: Arc<dyn GenerativeModel>,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(model: Arc<dyn GenerativeModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    /// Submits the prompt and returns the raw reply text, retrying rate
    /// limits up to `retry.max_attempts` total attempts.
    pub async fn invoke_text(&self, prompt: &str) -> Result<String, LlmError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.model.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(LlmError::RateLimited) if attempt < max_attempts => {
                    warn!(
                        "model call rate limited (attempt {attempt}/{max_attempts}), retrying in {}s",
                        self.retry.backoff.as_secs()
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(LlmError::RateLimited) => {
                    return Err(LlmError::RetriesExhausted { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Submits the prompt and parses the reply as JSON, stripping Markdown
    /// code fences first. Models wrap JSON in fences despite instructions
    /// not to, so the fences are forgiven; anything else that fails to
    /// parse is fatal.
    pub async fn invoke_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let text = self.invoke_text(prompt).await?;
        let cleaned = strip_json_fences(&text);
        serde_json::from_str(cleaned).map_err(LlmError::Json)
    }
}

/// Strips a leading ```json (or bare ```) fence and the matching trailing
/// fence from model output. Text without fences passes through untouched.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let inner = inner.trim_start();
    match inner.strip_suffix("```") {
        Some(body) => body.trim_end(),
        None => inner,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
