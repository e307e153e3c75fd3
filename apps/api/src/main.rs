mod config;
mod errors;
mod extract;
mod guidance;
mod llm_client;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::gemini::{self, GeminiClient};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor-api v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Guidance directory: {} (re-scanned on every request)",
        config.guidance_dir.display()
    );
    info!(
        "Worst-case pipeline latency with full retries and pacing: {}s",
        config.worst_case_pipeline_latency().as_secs()
    );

    let llm = if config.test_mode {
        warn!("TEST_MODE is enabled: every generation request returns the fixed mock result");
        None
    } else if let Some(key) = &config.google_api_key {
        info!("LLM client initialized (model: {})", gemini::MODEL);
        Some(LlmClient::new(
            Arc::new(GeminiClient::new(key.clone())),
            config.retry,
        ))
    } else {
        warn!("GOOGLE_API_KEY is not set: generation requests will fail until it is configured");
        None
    };

    let state = AppState {
        config: config.clone(),
        llm,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
