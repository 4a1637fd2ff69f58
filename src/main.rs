mod config;
mod error;
mod gate;
mod handlers;
mod health;
mod models;
mod moderation;
mod routes;
mod state;
mod store;
mod telemetry;
#[cfg(test)]
mod testing;

use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = config::Config::from_env()?;
    telemetry::init_logging(config.log_format)?;
    let metrics = telemetry::install_metrics_recorder()?;

    info!(
        cooldown_secs = config.cooldown.as_secs(),
        moderation = ?config.moderation,
        "Initializing name gate"
    );
    let state = state::AppState::new(&config, metrics).await?;

    let app = routes::create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
