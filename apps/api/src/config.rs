use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::Stage;

const DEFAULT_PACING_SECS: u64 = 60;
const DEFAULT_BACKOFF_SECS: u64 = 120;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed-delay retry policy for rate-limited model calls.
///
/// `max_attempts` counts total attempts, so the default of 3 allows at most
/// two backoff waits before a call is declared failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Built once at startup and carried in `AppState`; nothing reads ambient
/// env after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini credential. `None` is tolerated at startup (with a warning) so
    /// the service can still boot for test mode; generation requests outside
    /// test mode then fail with a configuration error.
    pub google_api_key: Option<String>,
    /// Directory of guidance documents, re-scanned fresh on every request.
    pub guidance_dir: PathBuf,
    /// When set, the pipeline is bypassed and a fixed mock result is
    /// returned without any model call, guidance load, or wait.
    pub test_mode: bool,
    /// Mandatory pause between consecutive pipeline stages.
    pub stage_pacing: Duration,
    pub retry: RetryPolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            guidance_dir: PathBuf::from(
                std::env::var("GUIDANCE_DIR").unwrap_or_else(|_| "guidance".to_string()),
            ),
            test_mode: env_flag("TEST_MODE"),
            stage_pacing: Duration::from_secs(env_parse(
                "STAGE_PACING_SECS",
                DEFAULT_PACING_SECS,
            )?),
            retry: RetryPolicy {
                max_attempts: env_parse("LLM_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
                backoff: Duration::from_secs(env_parse(
                    "RATE_LIMIT_BACKOFF_SECS",
                    DEFAULT_BACKOFF_SECS,
                )?),
            },
            port: env_parse("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Upper bound on how long one request can spend waiting: every stage
    /// exhausting its backoff waits before succeeding, plus the mandatory
    /// pacing between stages. With the defaults this is 1140s (19 minutes),
    /// which is why a repeatedly rate-limited request can block for a long
    /// time. Logged at startup as an operational property.
    pub fn worst_case_pipeline_latency(&self) -> Duration {
        let stages = Stage::ORDER.len() as u32;
        let backoffs = self.retry.backoff * (self.retry.max_attempts.saturating_sub(1)) * stages;
        let pacing = self.stage_pacing * (stages - 1);
        backoffs + pacing
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid value, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
