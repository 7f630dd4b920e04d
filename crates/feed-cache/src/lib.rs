//! # feed-cache
//!
//! Persistence for the viewer's recent-message window.
//!
//! ## Features
//!
//! - **Feed Store**: capacity-bounded, oldest-first message cache with FIFO or batch eviction
//! - **File Store**: one JSON document per key, written atomically
//! - **Memory Store**: in-process backend with an optional byte quota
//!
//! ## Example
//!
//! ```ignore
//! use feed_cache::{FeedStore, FeedStoreConfig, FileStore};
//!
//! let storage = FileStore::open("./state")?;
//! let mut store = FeedStore::new(storage, FeedStoreConfig::from(&config.viewer));
//!
//! let cached = store.load();
//! store.append(message);
//! ```

pub mod feed;
pub mod store;

// Re-export feed types
pub use feed::{EvictionPolicy, FeedStore, FeedStoreConfig, MESSAGES_KEY};

// Re-export storage backends
pub use store::{FileStore, MemoryStore};
