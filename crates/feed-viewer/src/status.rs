//! Connection state machine
//!
//! `Connecting -> Connected -> Disconnected`. Disconnected is terminal; the
//! viewer never reconnects on its own.

use std::fmt;

use crate::subscription::SubscriptionEvent;

/// Live subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// Status line text shown for this state
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting…",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected, refresh?",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// State after `event`, or `None` if the event does not change it
    #[must_use]
    pub fn on_event(&self, event: &SubscriptionEvent) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        match event {
            SubscriptionEvent::Opened if *self == Self::Connecting => Some(Self::Connected),
            SubscriptionEvent::Closed | SubscriptionEvent::Error(_) => Some(Self::Disconnected),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        })
    }
}
