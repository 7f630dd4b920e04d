//! Relay server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p feed-relay
//! ```
//!
//! Configuration is loaded from environment variables.

use feed_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Relay failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_settings(&config.app)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.relay.address(),
        messages = %config.relay.messages_path.display(),
        guilds = config.relay.invites.len(),
        "Configuration loaded"
    );

    feed_relay::run(config).await?;

    Ok(())
}
