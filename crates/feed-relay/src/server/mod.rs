//! Relay server setup
//!
//! Provides the router and the server lifecycle.

mod handler;
mod state;

pub use handler::{
    fallback_handler, health_check, invites_handler, recents_handler, subscribe_handler,
};
pub use state::RelayState;

use crate::tail::{self, TailConfig};
use axum::{routing::get, Router};
use feed_common::{AppConfig, AppError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the relay router
pub fn create_router() -> Router<RelayState> {
    Router::new()
        .route("/invites", get(invites_handler))
        .route("/recents", get(recents_handler))
        .route("/subscribe", get(subscribe_handler))
        .route("/health", get(health_check))
        .fallback(fallback_handler)
}

/// Build the complete application
pub fn create_app(state: RelayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the application on an already bound listener
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), AppError> {
    let addr = listener.local_addr()?;
    tracing::info!("Relay listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the relay: follow the message log and serve the endpoints
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let relay = config.relay;
    let address = relay.address();
    let tail_config = TailConfig::from(&relay);

    let state = RelayState::from_config(relay);

    let hub = state.hub().clone();
    tokio::spawn(async move {
        if let Err(e) = tail::follow(hub, tail_config).await {
            tracing::error!(error = %e, "Message log follower stopped");
        }
    });

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {address}: {e}")))?;

    run_server(create_app(state), listener).await
}
