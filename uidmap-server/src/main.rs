use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod agent;
pub mod api;
pub mod config;
pub mod service;
pub mod state;

use agent::HttpAgentClient;
use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uidmap_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting uidmap server...");

    let config = ServerConfig::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Agent endpoint {} (unverified), certificates in {}",
        config.agent_url,
        config.cert_dir.display()
    );

    let agent = Arc::new(HttpAgentClient::new(&config));
    let addr = config.bind_addr.clone();
    let state = AppState::new(config, agent);

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
