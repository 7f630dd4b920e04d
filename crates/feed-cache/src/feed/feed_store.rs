//! Feed store - the persisted window of recent messages
//!
//! Messages are kept oldest first and never exceed the configured capacity.
//! Persistence is best-effort: a failed write is logged and the in-memory
//! sequence stays authoritative.

use feed_common::ViewerConfig;
use feed_core::{FeedError, FeedResult, KeyValueStore, Message};

use super::EvictionPolicy;

/// Storage key holding the cached messages
pub const MESSAGES_KEY: &str = "messages";

/// Feed store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStoreConfig {
    /// Maximum number of cached messages
    pub capacity: usize,
    pub eviction: EvictionPolicy,
}

impl Default for FeedStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            eviction: EvictionPolicy::Fifo,
        }
    }
}

impl From<&ViewerConfig> for FeedStoreConfig {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            capacity: config.cache_capacity,
            eviction: EvictionPolicy::from_batch(config.eviction_batch),
        }
    }
}

/// Capacity-bounded message cache over a key-value backend
#[derive(Debug)]
pub struct FeedStore<S> {
    storage: S,
    config: FeedStoreConfig,
    messages: Vec<Message>,
}

impl<S: KeyValueStore> FeedStore<S> {
    /// Create an empty store; call [`FeedStore::load`] to restore cached messages
    pub fn new(storage: S, config: FeedStoreConfig) -> Self {
        Self {
            storage,
            config: FeedStoreConfig {
                capacity: config.capacity.max(1),
                ..config
            },
            messages: Vec::new(),
        }
    }

    /// Restore the cached sequence, oldest first.
    ///
    /// Missing or malformed data yields an empty sequence.
    pub fn load(&mut self) -> Vec<Message> {
        self.messages = match self.storage.get(MESSAGES_KEY) {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding malformed feed cache");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read feed cache");
                Vec::new()
            }
        };

        let overflow = self.messages.len().saturating_sub(self.config.capacity);
        if overflow > 0 {
            self.messages.drain(..overflow);
        }

        tracing::debug!(count = self.messages.len(), "Feed cache loaded");
        self.messages.clone()
    }

    /// Add a message at the newest end, evict, and persist
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);

        let evict = self
            .config
            .eviction
            .evict_count(self.messages.len(), self.config.capacity);
        if evict > 0 {
            self.messages.drain(..evict);
            tracing::trace!(evicted = evict, "Evicted oldest cached messages");
        }

        self.persist();
    }

    /// Replace the cache with a backlog (oldest first) and persist
    pub fn replace(&mut self, messages: Vec<Message>) {
        let skip = messages.len().saturating_sub(self.config.capacity);
        self.messages = messages.into_iter().skip(skip).collect();
        self.persist();
    }

    /// Cached messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn eviction(&self) -> EvictionPolicy {
        self.config.eviction
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string(&self.messages) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode feed cache");
                return;
            }
        };

        if let Err(e) = self.storage.set(MESSAGES_KEY, &encoded) {
            tracing::warn!(
                error = %e,
                count = self.messages.len(),
                "Failed to persist feed cache"
            );
        }
    }
}

/// Decode a cached array, skipping entries that are not valid messages
fn decode(raw: &str) -> FeedResult<Vec<Message>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| FeedError::MalformedCache(e.to_string()))?;

    let total = entries.len();
    let messages: Vec<Message> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if messages.len() < total {
        tracing::warn!(
            skipped = total - messages.len(),
            "Skipping malformed cached messages"
        );
    }
    Ok(messages)
}
