//! # feed-core
//!
//! Domain layer containing the feed message model, the invite map, domain
//! errors and the key-value storage trait used for persistence.
//! This crate has zero dependencies on infrastructure (network, rendering, etc.).

pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{
    AttachmentKind, Author, Embed, InviteMap, Message, DEFAULT_AUTHOR_COLOR, VIDEO_EXTENSIONS,
};
pub use error::{FeedError, FeedResult};
pub use traits::{KeyValueStore, StorageError, StorageResult};
