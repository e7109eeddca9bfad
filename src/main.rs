use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use loko_fixtures::config::ServerConfig;
use loko_fixtures::handler::{create_router, AppState};
use loko_fixtures::renderer::HttpRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with tracing
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .try_init();

    // Config is read once here and passed down; nothing else touches the environment.
    let config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
    let addr = config.bind_address();

    let renderer = HttpRenderer::new(config.render.clone())?;
    let state = AppState::new(config, Arc::new(renderer))?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
