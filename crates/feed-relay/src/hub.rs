//! Subscriber hub
//!
//! Fans each published message out to every websocket subscriber and keeps a
//! bounded window of recent messages for `/recents`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use feed_core::{FeedResult, Message};
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Encoded message as sent to subscribers
pub type Payload = Arc<str>;

/// Delivery counts for one published message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers found closed and pruned
    pub pruned: usize,
}

/// Manages subscriber queues and the recent-message window
///
/// Uses `DashMap` so the tail task and websocket handlers never contend on a
/// single lock.
pub struct Hub {
    subscribers: DashMap<Uuid, mpsc::Sender<Payload>>,
    recents: RwLock<VecDeque<Message>>,
    recents_capacity: usize,
    queue_size: usize,
    following: AtomicBool,
}

impl Hub {
    /// Create a hub keeping `recents_capacity` messages and giving each
    /// subscriber a queue of `queue_size`
    #[must_use]
    pub fn new(recents_capacity: usize, queue_size: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            recents: RwLock::new(VecDeque::with_capacity(recents_capacity)),
            recents_capacity: recents_capacity.max(1),
            queue_size: queue_size.max(1),
            following: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn new_shared(recents_capacity: usize, queue_size: usize) -> Arc<Self> {
        Arc::new(Self::new(recents_capacity, queue_size))
    }

    /// Register a subscriber
    pub fn subscribe(&self) -> (Uuid, mpsc::Receiver<Payload>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_size);
        self.subscribers.insert(id, tx);

        tracing::debug!(subscriber = %id, "Subscriber added");
        (id, rx)
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            tracing::debug!(subscriber = %id, "Subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Mark the backlog as loaded; later lines are published live
    pub fn mark_following(&self) {
        self.following.store(true, Ordering::Release);
    }

    /// Whether the log follower has caught up with the backlog
    pub fn is_following(&self) -> bool {
        self.following.load(Ordering::Acquire)
    }

    /// Record a backlog line without broadcasting it
    pub fn backfill(&self, line: &str) -> FeedResult<()> {
        let message = Message::from_json(line.trim())?;
        self.remember(message);
        Ok(())
    }

    /// Record a line and send it to every subscriber.
    ///
    /// A full queue drops the message for that subscriber only; closed
    /// queues are pruned.
    pub fn publish(&self, line: &str) -> FeedResult<PublishOutcome> {
        let line = line.trim();
        let message = Message::from_json(line)?;
        let payload: Payload = Arc::from(line);

        let mut outcome = PublishOutcome::default();
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            match entry.value().try_send(Arc::clone(&payload)) {
                Ok(()) => outcome.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %entry.key(), "Subscriber queue full, dropping message");
                    outcome.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // removing while iterating would deadlock on the shard lock
        for id in &closed {
            self.subscribers.remove(id);
        }
        outcome.pruned = closed.len();

        tracing::trace!(
            id = %message.id,
            guild = %message.guild,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "Message published"
        );

        self.remember(message);
        Ok(outcome)
    }

    /// Recent messages, oldest first
    pub fn recents(&self) -> Vec<Message> {
        self.recents.read().iter().cloned().collect()
    }

    fn remember(&self, message: Message) {
        let mut recents = self.recents.write();
        recents.push_back(message);
        while recents.len() > self.recents_capacity {
            recents.pop_front();
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("subscribers", &self.subscribers.len())
            .field("recents", &self.recents.read().len())
            .field("recents_capacity", &self.recents_capacity)
            .field("queue_size", &self.queue_size)
            .field("following", &self.is_following())
            .finish()
    }
}
