//! tasksync server -- in-memory task record storage over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080
//! cargo run --bin tasksync-server
//!
//! # Run on custom address
//! cargo run --bin tasksync-server -- --bind 127.0.0.1:9100
//!
//! # Or via environment variable
//! TASKSYNC_ADDR=127.0.0.1:9100 cargo run --bin tasksync-server
//! ```

use std::sync::Arc;

use clap::Parser;
use tasksync_server::config::{ServerCliArgs, ServerConfig};
use tasksync_server::server::{self, ServerState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        addr = %config.bind_addr,
        max_page_size = config.limits.max_page_size,
        "starting tasksync server"
    );

    let state = Arc::new(ServerState::with_config(&config));

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
