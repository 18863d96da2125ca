//! Token endpoint response and request inputs
//!
//! The cache never talks to the token endpoint. It reads the parsed
//! response plus the request parameters that produced it, and builds cache
//! items from both. ID token claims are read without signature validation:
//! they only feed display fields (username, names), never trust decisions.

use std::collections::BTreeSet;

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::client_info::URL_SAFE_LENIENT;
use crate::dictionary::Dictionary;

/// Response from the token endpoint.
///
/// Every field is optional: which artifacts a response yields depends on
/// the grant and the requested scopes. Fields not modeled here land in
/// `additional` and are carried into the items' additional info.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Raw compact JWT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<String>,
    /// Space separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub ext_expires_in: Option<u64>,
    /// Family of client IDs the refresh token is shared with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foci: Option<String>,
    /// Claims already parsed by the caller. Takes precedence over `id_token`.
    #[serde(skip)]
    pub id_token_claims: Option<IdTokenClaims>,
    #[serde(flatten)]
    pub additional: Dictionary,
}

impl TokenResponse {
    /// Parse a token endpoint JSON body.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// ID token claims, from `id_token_claims` or decoded from `id_token`.
    pub fn claims(&self) -> Option<IdTokenClaims> {
        if let Some(claims) = &self.id_token_claims {
            return Some(claims.clone());
        }
        let raw = self.id_token.as_deref()?;
        let claims = IdTokenClaims::from_jwt(raw);
        if claims.is_none() {
            warn!("id_token payload is not decodable, identity claims unavailable");
        }
        claims
    }

    /// Granted scopes as a set.
    pub fn scopes(&self) -> BTreeSet<String> {
        split_scopes(self.scope.as_deref().unwrap_or_default())
    }
}

/// Split a space separated scope string into a set.
pub(crate) fn split_scopes(scope: &str) -> BTreeSet<String> {
    scope.split_whitespace().map(str::to_owned).collect()
}

/// Accept `expires_in` as a JSON number or a numeric string; some token
/// endpoints send the latter.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(n)) => Ok(Some(n)),
        Some(Seconds::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// The subset of OIDC ID token claims the cache reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Object id of the user in its home tenant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a compact JWT. Does not verify it.
    pub fn from_jwt(raw: &str) -> Option<Self> {
        let payload = raw.split('.').nth(1)?;
        let bytes = URL_SAFE_LENIENT.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Display username: `preferred_username`, then `upn`, then `email`.
    pub fn username(&self) -> Option<&str> {
        [&self.preferred_username, &self.upn, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
    }

    /// Stable per-tenant account id: `oid`, falling back to `sub`.
    pub fn local_account_id(&self) -> Option<&str> {
        self.oid.as_deref().or(self.sub.as_deref())
    }
}

/// Parameters of the request that produced a token response.
///
/// The cache reads only `authority` and `client_id`; the correlation id is
/// attached to log events.
#[derive(Debug, Clone, Default)]
pub struct RequestParameters {
    /// Final authority, already resolved through any alias table
    pub authority: Option<String>,
    pub client_id: Option<String>,
    pub correlation_id: Option<Uuid>,
}

impl RequestParameters {
    /// Parameters for a fresh request with a new correlation id.
    pub fn new(authority: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            authority: Some(authority.into()),
            client_id: Some(client_id.into()),
            correlation_id: Some(Uuid::new_v4()),
        }
    }
}
