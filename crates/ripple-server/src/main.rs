//! # Ripple Server
//!
//! Realtime chat relay and call-signaling server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! RIPPLE_JWT_SECRET=... ripple
//!
//! # Run with environment variables
//! RIPPLE_PORT=8080 RIPPLE_HOST=0.0.0.0 RIPPLE_JWT_SECRET=... ripple
//! ```
//!
//! Configuration is read from `ripple.toml` when present; see
//! [`config::Config`] for the full set of sections.

mod auth;
mod config;
mod handlers;
mod metrics;
mod store;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    if config.auth.jwt_secret.is_empty() {
        anyhow::bail!("No JWT secret configured; set RIPPLE_JWT_SECRET or [auth].jwt_secret");
    }

    tracing::info!("Starting Ripple server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
