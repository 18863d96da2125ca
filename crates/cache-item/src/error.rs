//! Error types for cache item construction and decoding

/// Errors from building, encoding or decoding cache items.
///
/// Client info decoding never produces one of these: an unreadable claim
/// degrades to an empty identity instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required envelope field was absent from the request/response.
    /// This is a caller bug, not a recoverable condition.
    #[error("cannot build cache item: {0}")]
    Construction(String),

    #[error("malformed cache record: {0}")]
    Parse(String),

    #[error("unsupported archive format version {found} (supported: {supported:?})")]
    UnsupportedVersion {
        found: u16,
        supported: &'static [u16],
    },

    #[error("cannot encode cache record: {0}")]
    Encode(String),
}

impl Error {
    /// Whether this is a per-record decoding failure.
    ///
    /// Loaders skip such records and keep going; an unsupported archive
    /// version is handled exactly like a malformed record.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnsupportedVersion { .. })
    }
}

/// Result alias for cache item operations.
pub type Result<T> = std::result::Result<T, Error>;
