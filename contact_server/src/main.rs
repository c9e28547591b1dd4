//! Main entry point for the contact form server binary

use anyhow::Result;
use contact_core::{create_app, run_server, AppConfig, AppState, EmailJsClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let relay = EmailJsClient::new(&config.relay)
        .map_err(|e| anyhow::anyhow!("Failed to build relay client: {}", e))?;
    info!("Relay endpoint: {}", relay.endpoint());

    let state = AppState::new(&config, Arc::new(relay));

    info!("Relay configured: {}", state.adapter.check_config().is_ok());
    if config.relay.allow_test_route {
        warn!("Relay test route is enabled at POST /api/contact/test");
    }

    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state, &config);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!(
            "{}={},contact_core={},tower_http=debug",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
