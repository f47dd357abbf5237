//! Simple IRC Server - Entry Point
//!
//! Parses flags, binds the listener and serves connections.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use irc_server::{message::SERVER_TAG, server, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=irc_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("irc_server=info")),
        )
        .init();

    let config = Config::parse();

    let listener = match server::bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        "{} Simple IRC Server started at {}",
        SERVER_TAG,
        config.bind_addr()
    );

    server::serve(listener, config).await?;
    Ok(())
}
