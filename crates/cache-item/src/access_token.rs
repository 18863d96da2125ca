//! Access token cache item
//!
//! Identity is envelope + realm + scope set + token type. Expiry and cache
//! timestamps are servicing data: a fresher token for the same identity
//! compares equal to the stale one and replaces it.

use std::collections::BTreeSet;
use std::fmt;

use common::Secret;

use crate::base::BaseCacheItem;
use crate::constants::{DEFAULT_EXPIRES_IN, keys, tags};
use crate::dictionary::{Dictionary, FieldReader, insert_opt_str, insert_seconds, insert_str};
use crate::error::{Error, Result};
use crate::record::CacheRecord;
use crate::token::{RequestParameters, TokenResponse, split_scopes};

/// How the access token is presented to resource servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TokenType {
    #[default]
    Bearer,
    /// Proof-of-possession
    Pop,
    Other(String),
}

impl TokenType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bearer => "Bearer",
            Self::Pop => "pop",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for TokenType {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("bearer") {
            Self::Bearer
        } else if value.eq_ignore_ascii_case("pop") {
            Self::Pop
        } else {
            Self::Other(value.to_owned())
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    base: BaseCacheItem,
    secret: Secret<String>,
    scopes: BTreeSet<String>,
    token_type: TokenType,
    realm: String,
    /// Unix seconds
    cached_at: u64,
    expires_on: u64,
    extended_expires_on: Option<u64>,
}

impl AccessToken {
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let base = BaseCacheItem::from_response(response, params)?;
        Self::from_parts(base, response, crate::now_secs())
    }

    /// Build with an explicit "now", in unix seconds.
    pub fn from_parts(base: BaseCacheItem, response: &TokenResponse, now: u64) -> Result<Self> {
        let secret = response
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Construction("token response carries no access_token".into()))?;
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);

        Ok(Self {
            realm: base.tenant(),
            base,
            secret: Secret::from(secret),
            scopes: response.scopes(),
            token_type: response
                .token_type
                .as_deref()
                .map(TokenType::from)
                .unwrap_or_default(),
            cached_at: now,
            expires_on: now.saturating_add(expires_in),
            extended_expires_on: response.ext_expires_in.map(|ext| now.saturating_add(ext)),
        })
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// Scopes as the space separated `target` string.
    pub fn target(&self) -> String {
        self.scopes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn cached_at(&self) -> u64 {
        self.cached_at
    }

    pub fn expires_on(&self) -> u64 {
        self.expires_on
    }

    pub fn extended_expires_on(&self) -> Option<u64> {
        self.extended_expires_on
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_on
    }

    /// Whether the token expires within `window` seconds of `now`.
    pub fn expires_within(&self, now: u64, window: u64) -> bool {
        now.saturating_add(window) >= self.expires_on
    }
}

impl CacheRecord for AccessToken {
    const TYPE_TAG: &'static str = tags::ACCESS_TOKEN;

    fn base(&self) -> &BaseCacheItem {
        &self.base
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut map = self.base.dictionary_head(Self::TYPE_TAG);
        insert_str(&mut map, keys::SECRET, self.secret.expose().as_str());
        insert_str(&mut map, keys::TARGET, self.target());
        insert_str(&mut map, keys::TOKEN_TYPE, self.token_type.as_str());
        insert_str(&mut map, keys::REALM, self.realm.as_str());
        insert_seconds(&mut map, keys::CACHED_AT, self.cached_at);
        insert_seconds(&mut map, keys::EXPIRES_ON, self.expires_on);
        insert_opt_str(
            &mut map,
            keys::EXTENDED_EXPIRES_ON,
            self.extended_expires_on.map(|s| s.to_string()).as_deref(),
        );
        self.base.finish_dictionary(map)
    }

    fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let mut fields = FieldReader::new(fields);
        fields.expect_type_tag(Self::TYPE_TAG)?;
        let base = BaseCacheItem::read(&mut fields)?;

        let secret = fields.required_str(keys::SECRET)?;
        let scopes = fields
            .optional_str(keys::TARGET)?
            .map(|target| split_scopes(&target))
            .unwrap_or_default();
        let token_type = fields
            .optional_str(keys::TOKEN_TYPE)?
            .as_deref()
            .map(TokenType::from)
            .unwrap_or_default();
        let realm = fields
            .optional_str(keys::REALM)?
            .unwrap_or_else(|| base.tenant());
        let cached_at = fields.optional_seconds(keys::CACHED_AT)?.unwrap_or_default();
        let expires_on = fields.required_seconds(keys::EXPIRES_ON)?;
        let extended_expires_on = fields.optional_seconds(keys::EXTENDED_EXPIRES_ON)?;

        Ok(Self {
            base: base.with_additional_info(fields.into_remaining()),
            secret: Secret::new(secret),
            scopes,
            token_type,
            realm,
            cached_at,
            expires_on,
            extended_expires_on,
        })
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.realm == other.realm
            && self.scopes == other.scopes
            && self.token_type == other.token_type
    }
}

impl Eq for AccessToken {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{NOW, dictionary, full_response, params, response_with};
    use serde_json::json;

    fn token(response: &TokenResponse) -> AccessToken {
        let base = BaseCacheItem::from_response(response, &params()).unwrap();
        AccessToken::from_parts(base, response, NOW).unwrap()
    }

    #[test]
    fn builds_from_response() {
        let at = token(&full_response());
        assert_eq!(at.secret().expose(), "at_secret");
        assert_eq!(at.target(), "mail.read user.read");
        assert_eq!(at.token_type(), &TokenType::Bearer);
        assert_eq!(at.realm(), "T1");
        assert_eq!(at.cached_at(), NOW);
        assert_eq!(at.expires_on(), NOW + 3600);
        assert_eq!(at.extended_expires_on(), Some(NOW + 7200));
        assert!(!format!("{at:?}").contains("at_secret"));
    }

    #[test]
    fn missing_access_token_is_construction_error() {
        let response = response_with(|r| r.refresh_token = Some("rt".into()));
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        let err = AccessToken::from_parts(base, &response, NOW).unwrap_err();
        assert!(matches!(err, Error::Construction(_)), "got {err:?}");
    }

    #[test]
    fn default_lifetime_applies_without_expires_in() {
        let at = token(&response_with(|r| r.access_token = Some("at".into())));
        assert_eq!(at.expires_on(), NOW + DEFAULT_EXPIRES_IN);
        assert_eq!(at.extended_expires_on(), None);
        assert_eq!(at.realm(), "common");
    }

    #[test]
    fn expiry_checks() {
        let at = token(&full_response());
        assert!(!at.is_expired_at(NOW));
        assert!(at.is_expired_at(NOW + 3600));
        assert!(!at.expires_within(NOW, 300));
        assert!(at.expires_within(NOW + 3400, 300));
    }

    #[test]
    fn token_type_parsing() {
        assert_eq!(TokenType::from("bearer"), TokenType::Bearer);
        assert_eq!(TokenType::from("PoP"), TokenType::Pop);
        assert_eq!(TokenType::from("ssh-cert"), TokenType::Other("ssh-cert".into()));
        assert_eq!(TokenType::Pop.to_string(), "pop");
    }

    #[test]
    fn scope_order_does_not_change_identity() {
        let a = token(&response_with(|r| {
            r.access_token = Some("at_1".into());
            r.scope = Some("a b".into());
        }));
        let b = token(&response_with(|r| {
            r.access_token = Some("at_2".into());
            r.scope = Some("b a".into());
        }));
        assert_eq!(a, b);
    }

    #[test]
    fn identity_fields_distinguish_tokens() {
        let base = token(&full_response());
        let narrower = token(&response_with(|r| {
            *r = full_response();
            r.scope = Some("user.read".into());
        }));
        let pop = token(&response_with(|r| {
            *r = full_response();
            r.token_type = Some("pop".into());
        }));
        assert_ne!(base, narrower);
        assert_ne!(base, pop);
    }

    #[test]
    fn refreshed_token_replaces_stale_one() {
        let stale = token(&full_response());
        let response = full_response();
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        let fresh = AccessToken::from_parts(base, &response, NOW + 1800).unwrap();
        assert_eq!(stale, fresh);
        assert_ne!(stale.expires_on(), fresh.expires_on());
    }

    #[test]
    fn dictionary_layout() {
        let map = token(&full_response()).to_dictionary();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "credential_type",
                "authority",
                "client_id",
                "client_info",
                "username",
                "secret",
                "target",
                "token_type",
                "realm",
                "cached_at",
                "expires_on",
                "extended_expires_on",
            ]
        );
        assert_eq!(map["credential_type"], "AccessToken");
        assert_eq!(map["expires_on"], (NOW + 3600).to_string());
    }

    #[test]
    fn dictionary_round_trip_preserves_every_field() {
        let at = token(&full_response());
        let parsed = AccessToken::from_dictionary(at.to_dictionary()).unwrap();
        assert_eq!(parsed, at);
        assert_eq!(parsed.secret().expose(), "at_secret");
        assert_eq!(parsed.expires_on(), at.expires_on());
        assert_eq!(parsed.cached_at(), at.cached_at());
        assert_eq!(parsed.extended_expires_on(), at.extended_expires_on());
        assert_eq!(parsed.base().username(), Some("alice@contoso.com"));
        assert_eq!(parsed.to_dictionary(), at.to_dictionary());
    }

    #[test]
    fn archive_round_trip() {
        let at = token(&full_response());
        let bytes = at.to_secure_archive().unwrap();
        let parsed = AccessToken::from_secure_archive(&bytes).unwrap();
        assert_eq!(parsed, at);
        assert_eq!(parsed.to_dictionary(), at.to_dictionary());
    }

    #[test]
    fn minimal_dictionary_uses_defaults() {
        let at = AccessToken::from_dictionary(dictionary(json!({
            "authority": "https://login.example.com/tenant-a",
            "client_id": "app1",
            "secret": "at",
            "expires_on": 1700003600,
        })))
        .unwrap();
        assert!(at.scopes().is_empty());
        assert_eq!(at.token_type(), &TokenType::Bearer);
        assert_eq!(at.realm(), "tenant-a");
        assert_eq!(at.cached_at(), 0);
        assert_eq!(at.base().unique_user_id(), "");
    }

    #[test]
    fn missing_secret_or_expiry_is_parse_error() {
        let mut map = token(&full_response()).to_dictionary();
        map.remove(keys::SECRET);
        assert!(AccessToken::from_dictionary(map).unwrap_err().is_parse());

        let mut map = token(&full_response()).to_dictionary();
        map.remove(keys::EXPIRES_ON);
        assert!(AccessToken::from_dictionary(map).unwrap_err().is_parse());
    }
}
