//! Relay state
//!
//! Application state shared by the relay's handlers.

use crate::hub::Hub;
use feed_common::RelayConfig;
use feed_core::InviteMap;
use std::sync::Arc;

/// Relay application state
#[derive(Clone)]
pub struct RelayState {
    /// Subscriber queues and recent messages
    hub: Arc<Hub>,
    /// Relay configuration, including the invite map
    config: Arc<RelayConfig>,
}

impl RelayState {
    /// Create a new relay state
    pub fn new(hub: Arc<Hub>, config: RelayConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
        }
    }

    /// Create state with a fresh hub sized from the configuration
    pub fn from_config(config: RelayConfig) -> Self {
        let hub = Hub::new_shared(config.recents_capacity, config.queue_size);
        Self::new(hub, config)
    }

    /// Get the subscriber hub
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Get the invite map
    pub fn invites(&self) -> &InviteMap {
        &self.config.invites
    }

    /// Get the relay configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("hub", &self.hub)
            .field("config", &"RelayConfig")
            .finish()
    }
}
