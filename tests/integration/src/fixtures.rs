//! Test fixtures and data generators
//!
//! Provides message log lines and invite maps for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use feed_core::InviteMap;
use serde_json::{json, Value};

/// Counter for unique message ids
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique message id
pub fn unique_id() -> String {
    COUNTER.fetch_add(1, Ordering::SeqCst).to_string()
}

/// Invite map with two guilds
pub fn test_invites() -> InviteMap {
    [
        ("EleutherAI", "https://discord.gg/zBGx3azzUn"),
        ("Mathematics", "https://discord.gg/mathematics"),
    ]
    .into_iter()
    .collect()
}

/// Builder for one message log line
#[derive(Debug, Clone)]
pub struct MessageLine {
    value: Value,
}

impl MessageLine {
    pub fn new(guild: &str, content: &str) -> Self {
        Self {
            value: json!({
                "id": unique_id(),
                "guild": guild,
                "guild_id": "81384788765712384",
                "channel": "general",
                "channel_id": "81384788765712385",
                "author": {
                    "name": "alice",
                    "color": "#e91e63",
                    "avatar": "https://cdn.discordapp.com/avatars/1/abc.png?size=128"
                },
                "content": content,
            }),
        }
    }

    pub fn attachment(mut self, url: &str) -> Self {
        self.value["attachments"] = json!([url]);
        self
    }

    pub fn id(&self) -> &str {
        self.value["id"].as_str().unwrap_or_default()
    }

    /// Serialize to a single log line
    pub fn line(&self) -> String {
        self.value.to_string()
    }
}
