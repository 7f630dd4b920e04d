//! Eviction policy for the feed cache

/// How many of the oldest messages to drop when the cache overflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Drop exactly the overflow
    #[default]
    Fifo,
    /// Drop at least `n` messages once the cache overflows, always
    /// keeping the newest one
    Batch(usize),
}

impl EvictionPolicy {
    /// Policy for an optional batch size; `None` means strict FIFO
    #[must_use]
    pub fn from_batch(batch: Option<usize>) -> Self {
        match batch {
            Some(n) if n > 1 => Self::Batch(n),
            _ => Self::Fifo,
        }
    }

    /// Number of oldest messages to evict from a cache of `len` items
    #[must_use]
    pub fn evict_count(&self, len: usize, capacity: usize) -> usize {
        let overflow = len.saturating_sub(capacity);
        if overflow == 0 {
            return 0;
        }
        match *self {
            Self::Fifo => overflow,
            Self::Batch(n) => n.min(len - 1).max(overflow),
        }
    }
}
