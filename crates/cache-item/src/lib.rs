//! Token cache items
//!
//! Immutable records for every artifact a token response leaves behind in
//! the persisted cache: access tokens, refresh tokens, ID tokens, accounts
//! and application metadata. Each record embeds the same envelope
//! (`BaseCacheItem`) and implements `CacheRecord`, which gives it two
//! interchangeable persisted forms:
//!
//! 1. `to_dictionary()` / `from_dictionary()`: a flat JSON object with
//!    stable key names, shared with other processes reading the same store
//! 2. `to_secure_archive()` / `from_secure_archive()`: versioned opaque
//!    bytes wrapping the dictionary, for platform credential vaults
//!
//! Records compare by identity (authority, client, user, and per-variant
//! fields), not by content: two access tokens that differ only in expiry
//! are equal, so one replaces the other in the cache.
//!
//! This crate does no I/O. Persistence lives in `cache-store`.

pub mod access_token;
pub mod account;
pub mod app_metadata;
pub mod archive;
pub mod authority;
pub mod base;
pub mod client_info;
pub mod constants;
pub mod dictionary;
pub mod error;
pub mod id_token;
pub mod item;
pub mod record;
pub mod refresh_token;
pub mod token;

#[cfg(test)]
mod fixtures;

pub use access_token::{AccessToken, TokenType};
pub use account::Account;
pub use app_metadata::AppMetadata;
pub use base::BaseCacheItem;
pub use client_info::ClientInfo;
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use id_token::IdToken;
pub use item::CacheItem;
pub use record::CacheRecord;
pub use refresh_token::RefreshToken;
pub use token::{IdTokenClaims, RequestParameters, TokenResponse};

/// Current unix time in seconds.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
