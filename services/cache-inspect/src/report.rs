//! One JSON line per cached item

use cache_item::{CacheItem, authority};
use serde_json::{Value, json};

/// Describe a cache entry without exposing any secret material.
pub fn describe(key: &str, item: &CacheItem, now: u64, expiry_window: u64) -> Value {
    let base = item.base();
    let mut line = json!({
        "key": key,
        "type": item.type_tag(),
        "unique_user_id": base.unique_user_id(),
        "authority": authority::normalize(base.authority()),
        "client_id": base.client_id(),
    });

    if let (CacheItem::AccessToken(token), Some(fields)) = (item, line.as_object_mut()) {
        fields.insert("expires_on".into(), json!(token.expires_on()));
        fields.insert("expired".into(), json!(token.is_expired_at(now)));
        fields.insert(
            "expiring_soon".into(),
            json!(token.expires_within(now, expiry_window)),
        );
    }

    line
}
