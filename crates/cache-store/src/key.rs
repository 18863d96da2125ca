//! Cache key derivation
//!
//! A key is the item's identity fields joined with `|`: type tag, unique
//! user id, normalized authority, client id, then the variant's own
//! identity fields. Items that compare equal always share a key, so a
//! write for an existing identity lands in the existing slot. `\` and `|`
//! inside a field are backslash-escaped so distinct field lists never join
//! to the same key.

use cache_item::authority;
use cache_item::CacheItem;

const SEPARATOR: &str = "|";

pub fn cache_key(item: &CacheItem) -> String {
    let base = item.base();
    let mut parts = vec![
        item.type_tag().to_owned(),
        base.unique_user_id(),
        authority::normalize(base.authority()),
        base.client_id().to_owned(),
    ];

    match item {
        CacheItem::AccessToken(token) => {
            parts.push(token.realm().to_owned());
            parts.push(token.token_type().as_str().to_owned());
            parts.push(token.target());
        }
        CacheItem::RefreshToken(token) => {
            parts.push(token.family_id().unwrap_or_default().to_owned());
        }
        CacheItem::IdToken(token) => {
            parts.push(token.realm().to_owned());
        }
        CacheItem::Account(account) => {
            parts.push(account.home_account_id().to_owned());
            parts.push(account.environment().to_owned());
            parts.push(account.realm().to_owned());
        }
        CacheItem::AppMetadata(metadata) => {
            parts.push(metadata.environment().to_owned());
        }
    }

    parts
        .iter()
        .map(|part| escape(part))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn escape(field: &str) -> String {
    field.replace('\\', "\\\\").replace(SEPARATOR, "\\|")
}
