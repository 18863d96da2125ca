//! File-backed store for token cache items
//!
//! A thin persistence adapter around `cache-item`: each slot holds one
//! item as a base64 secure archive, keyed by the item's identity. Putting
//! an item whose identity already has a slot replaces it, which is how a
//! refreshed token overwrites the stale one.
//!
//! Loading is tolerant per record: an unreadable or unsupported record is
//! skipped with a warning and the rest of the cache stays usable.

pub mod error;
pub mod key;
pub mod store;

pub use error::{Error, Result};
pub use key::cache_key;
pub use store::CacheStore;
