//! Error types for cache store operations

/// Errors from cache store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    /// The store file as a whole is unreadable; individual bad records are
    /// skipped instead.
    #[error("cache file corrupt: {0}")]
    Corrupt(String),

    #[error("cache item error: {0}")]
    Item(#[from] cache_item::Error),
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
