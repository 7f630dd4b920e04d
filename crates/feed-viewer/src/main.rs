//! Viewer entry point
//!
//! Run with:
//! ```bash
//! FEED_BASE_URL=http://127.0.0.1:8080 cargo run -p feed-viewer
//! ```
//!
//! Configuration is loaded from environment variables.

use feed_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Viewer failed");
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
        base_url = %config.viewer.base_url,
        state_dir = %config.viewer.state_dir.display(),
        capacity = config.viewer.cache_capacity,
        "Configuration loaded"
    );

    feed_viewer::run(config).await?;

    Ok(())
}
