//! Attestation Gateway Binary
//!
//! Runs the HTTP gateway that places attestation tokens through MicroMDM and
//! serves the staged installer packages.

use std::env;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use attest_plane::{create_router, AppState, PlaneConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("ATTEST_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Configuration
    let config = PlaneConfig::from_env().expect("Invalid attestation gateway configuration");

    info!(
        port = config.port,
        token_store = ?config.token_store,
        public_url = %config.public_url,
        "Starting attestation gateway"
    );

    // Create application state
    let state = AppState::from_config(&config).expect("Failed to initialize attestation state");

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Attestation gateway listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
