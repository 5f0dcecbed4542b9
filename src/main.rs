//! dispatch-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use dispatch_gateway::app_state::AppState;
use dispatch_gateway::config::{GatewayConfig, LogFormat};
use dispatch_gateway::domain::EventBus;
use dispatch_gateway::persistence::{open_store, seed::seed_sample_data};
use dispatch_gateway::server::build_app;
use dispatch_gateway::service::BidPolicy;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting dispatch-gateway");

    // Build storage
    let store = open_store(&config)
        .await
        .context("failed to open storage")?;
    if config.seed_sample_data && seed_sample_data(store.as_ref()).await? {
        tracing::info!("sample drivers and jobs inserted");
    }

    // Build application state
    let event_bus = EventBus::new(config.event_bus_capacity);
    let policy = BidPolicy {
        require_verified_driver: config.require_verified_drivers,
    };
    let app_state = AppState::new(store, event_bus, policy);

    // Build router
    let app = build_app(app_state, config.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
