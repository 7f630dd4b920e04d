//! Capacity-bounded feed cache

mod eviction;
mod feed_store;

pub use eviction::EvictionPolicy;
pub use feed_store::{FeedStore, FeedStoreConfig, MESSAGES_KEY};
