use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state handed to route handlers by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured or test mode is on. Generation
    /// requests then fail with a configuration error, or return the mock,
    /// respectively.
    pub llm: Option<LlmClient>,
}
