//! # feed-relay
//!
//! Serves the viewer's endpoints from an append-only JSON-lines message log.
//!
//! - `GET /invites`: guild name to invite URL
//! - `GET /recents`: the most recent messages, oldest first
//! - `GET /subscribe`: websocket, one message per text frame

pub mod hub;
pub mod server;
pub mod tail;

pub use hub::{Hub, PublishOutcome};
pub use server::{create_app, create_router, run, run_server, RelayState};
pub use tail::{follow, TailConfig};
