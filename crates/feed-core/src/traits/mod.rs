//! Infrastructure-facing traits

mod storage;

pub use storage::{KeyValueStore, StorageError, StorageResult};
