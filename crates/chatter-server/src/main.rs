//! # Chatter Server
//!
//! Streaming chat server with per-workspace rooms.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! chatter
//!
//! # Run with environment variables
//! CHATTER_PORT=8080 CHATTER_HOST=0.0.0.0 chatter
//! ```
//!
//! Post a message and follow a room:
//!
//! ```bash
//! curl -d 'name=alice&text=hello' http://localhost:4567/chatter/lobby
//! curl -N http://localhost:4567/chatter/lobby
//! ```

mod config;
mod handlers;
mod metrics;
mod workspace;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatter_server=debug,chatter_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Chatter server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
