use std::sync::Arc;

use alt_text_generator::{server, AltTextClient, AppConfig};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let client = AltTextClient::new(config.client.clone()).context("failed to build HTTP client")?;

    let state = Arc::new(server::AppState {
        client,
        model_label: config.model_label.clone(),
    });
    let app = server::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        max_attempts = config.client.retry.max_attempts,
        "Alt text generator listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
