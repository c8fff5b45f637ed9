// AgroNIS ask service: answers questions about the AgroNIS smart farming project
// from a canned table first, then from Gemini, degrading to fixed Uzbek text when
// the upstream is unavailable. Also serves short sensor insights, an agronomist
// chat and a Maps-grounded search for nearby farm resources.

mod config;
mod error;
mod gemini_client;
mod http;
mod knowledge;
mod types;

use crate::config::Config;
use crate::gemini_client::GeminiClient;
use crate::http::{router, AppState};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    setup_logging();

    if config.gemini_api_key.is_none() {
        warn!("no VITE_GEMINI_API_KEY / GEMINI_API_KEY set; ask requests will fail with 500");
    }

    let generator = Arc::new(GeminiClient::from_config(&config));
    let addr = config.bind_addr;
    info!(
        model = %config.gen_model,
        chat_model = %config.chat_model,
        timeout_secs = config.upstream_timeout.as_secs(),
        "gemini client ready"
    );

    let app = router(Arc::new(AppState { config, generator }));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("AgroNIS ask service listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
