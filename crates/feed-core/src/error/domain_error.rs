//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::traits::StorageError;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum FeedError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Malformed message payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed feed cache: {0}")]
    MalformedCache(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown guild: {0}")]
    UnknownGuild(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for domain operations
pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    /// Get a stable error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Self::MalformedCache(_) => "MALFORMED_CACHE",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::UnknownGuild(_) => "UNKNOWN_GUILD",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error came from bad input data
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload(_) | Self::MalformedCache(_) | Self::InvalidUrl(_)
        )
    }
}
