//! Relay server entry point.
//!
//! Reads configuration from the environment (a local `.env` is honored),
//! wires the service in the bootstrap composition root and serves until
//! shutdown.

use tracing_subscriber::EnvFilter;

use augur_core::settings::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = RelayConfig::from_env()?;
    augur_axum::start_server(config).await
}
