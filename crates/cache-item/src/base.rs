//! Envelope shared by every cache item
//!
//! `BaseCacheItem` carries the fields every record has: where the token
//! came from (authority), who asked (client id), who it belongs to (client
//! info + username) and any response fields the model does not know about.
//! Variants embed it by value.
//!
//! Equality compares the normalized authority, the client id and the unique
//! user id. Username and additional info are carried but never compared.

use tracing::debug;
use url::Url;

use crate::authority;
use crate::client_info::{self, ClientInfo};
use crate::constants::keys;
use crate::dictionary::{Dictionary, FieldReader, insert_opt_str, insert_str};
use crate::error::{Error, Result};
use crate::token::{RequestParameters, TokenResponse};

#[derive(Debug, Clone)]
pub struct BaseCacheItem {
    authority: Url,
    client_id: String,
    client_info: Option<ClientInfo>,
    username: Option<String>,
    additional_info: Option<Dictionary>,
}

impl BaseCacheItem {
    /// Build the envelope for items produced by one token response.
    ///
    /// Fails only when the request parameters lack an authority or client
    /// id. An unreadable `client_info` degrades to the empty identity.
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let raw_authority = params
            .authority
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::Construction("request parameters carry no authority".into()))?;
        let authority = authority::parse(raw_authority).ok_or_else(|| {
            Error::Construction(format!("authority {raw_authority:?} is not an absolute URL"))
        })?;
        let client_id = params
            .client_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Construction("request parameters carry no client_id".into()))?
            .to_owned();

        let client_info = response.client_info.as_deref().and_then(ClientInfo::decode);
        let username = response
            .claims()
            .and_then(|claims| claims.username().map(str::to_owned));
        let additional: Dictionary = response
            .additional
            .iter()
            .filter(|(key, _)| !keys::is_reserved(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let additional_info = (!additional.is_empty()).then_some(additional);

        debug!(
            correlation_id = ?params.correlation_id,
            client_id = %client_id,
            authority = %authority,
            has_client_info = client_info.is_some(),
            "built cache item envelope"
        );

        Ok(Self {
            authority,
            client_id,
            client_info,
            username,
            additional_info,
        })
    }

    pub fn authority(&self) -> &Url {
        &self.authority
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `None` is the empty identity bucket, not an error.
    pub fn client_info(&self) -> Option<&ClientInfo> {
        self.client_info.as_ref()
    }

    /// `"<uid>.<utid>"`, the raw claim, or `""` for the empty identity.
    pub fn unique_user_id(&self) -> String {
        client_info::unique_user_id(self.client_info.as_ref())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn additional_info(&self) -> Option<&Dictionary> {
        self.additional_info.as_ref()
    }

    /// Authority host, e.g. `login.example.com`.
    pub fn environment(&self) -> String {
        authority::environment(&self.authority)
    }

    /// Tenant of the item: the client info `utid` when known, else the
    /// authority's first path segment, else `""`.
    pub fn tenant(&self) -> String {
        self.client_info
            .as_ref()
            .and_then(ClientInfo::utid)
            .map(str::to_owned)
            .or_else(|| authority::tenant(&self.authority))
            .unwrap_or_default()
    }

    /// Same envelope with the user identity stripped, for app-level records.
    pub(crate) fn without_user(self) -> Self {
        Self {
            client_info: None,
            username: None,
            ..self
        }
    }

    /// Envelope keys of a dictionary, starting with the type tag.
    pub(crate) fn dictionary_head(&self, type_tag: &str) -> Dictionary {
        let mut map = Dictionary::new();
        insert_str(&mut map, keys::CREDENTIAL_TYPE, type_tag);
        insert_str(&mut map, keys::AUTHORITY, self.authority.as_str());
        insert_str(&mut map, keys::CLIENT_ID, self.client_id.as_str());
        insert_opt_str(
            &mut map,
            keys::CLIENT_INFO,
            self.client_info.as_ref().map(ClientInfo::raw),
        );
        insert_opt_str(&mut map, keys::USERNAME, self.username.as_deref());
        map
    }

    /// Append additional info after the variant's own keys. Modeled key
    /// names are never written from additional info, even when the variant
    /// left them out.
    pub(crate) fn finish_dictionary(&self, mut map: Dictionary) -> Dictionary {
        if let Some(additional) = &self.additional_info {
            for (key, value) in additional {
                if !keys::is_reserved(key) && !map.contains_key(key) {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        map
    }

    /// Read the envelope keys. Additional info is attached afterwards with
    /// `with_additional_info`, once the variant consumed its own keys.
    pub(crate) fn read(fields: &mut FieldReader) -> Result<Self> {
        let raw_authority = fields.required_str(keys::AUTHORITY)?;
        let authority = authority::parse(&raw_authority).ok_or_else(|| {
            Error::Parse(format!("authority {raw_authority:?} is not an absolute URL"))
        })?;
        let client_id = fields.required_str(keys::CLIENT_ID)?;
        let client_info = fields
            .optional_str(keys::CLIENT_INFO)?
            .as_deref()
            .and_then(ClientInfo::decode);
        let username = fields.optional_str(keys::USERNAME)?;

        Ok(Self {
            authority,
            client_id,
            client_info,
            username,
            additional_info: None,
        })
    }

    pub(crate) fn with_additional_info(self, additional_info: Option<Dictionary>) -> Self {
        Self {
            additional_info,
            ..self
        }
    }
}

impl PartialEq for BaseCacheItem {
    fn eq(&self, other: &Self) -> bool {
        self.client_id == other.client_id
            && self.unique_user_id() == other.unique_user_id()
            && authority::same_authority(&self.authority, &other.authority)
    }
}

impl Eq for BaseCacheItem {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{params, response_with};
    use crate::token::IdTokenClaims;

    #[test]
    fn builds_envelope_from_response() {
        let response = response_with(|r| {
            r.client_info = Some(ClientInfo::encode("U1", "T1"));
            r.id_token_claims = Some(IdTokenClaims {
                preferred_username: Some("alice@contoso.com".into()),
                ..Default::default()
            });
        });
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();

        assert_eq!(base.unique_user_id(), "U1.T1");
        assert_eq!(base.username(), Some("alice@contoso.com"));
        assert_eq!(base.authority().as_str(), "https://login.example.com/common");
        assert_eq!(base.client_id(), "app1");
        assert_eq!(base.environment(), "login.example.com");
        assert_eq!(base.tenant(), "T1");
        assert!(base.additional_info().is_none());
    }

    #[test]
    fn undecodable_client_info_is_empty_identity() {
        let response = response_with(|r| r.client_info = Some("not-base64!!".into()));
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        assert_eq!(base.unique_user_id(), "");
        assert!(base.client_info().is_none());
        assert_eq!(base.tenant(), "common");
    }

    #[test]
    fn missing_client_id_or_authority_is_construction_error() {
        let response = TokenResponse::default();

        let mut no_client = params();
        no_client.client_id = None;
        let err = BaseCacheItem::from_response(&response, &no_client).unwrap_err();
        assert!(matches!(err, Error::Construction(_)), "got {err:?}");

        let mut no_authority = params();
        no_authority.authority = Some("   ".into());
        let err = BaseCacheItem::from_response(&response, &no_authority).unwrap_err();
        assert!(matches!(err, Error::Construction(_)), "got {err:?}");

        let mut relative = params();
        relative.authority = Some("/common".into());
        assert!(BaseCacheItem::from_response(&response, &relative).is_err());
    }

    #[test]
    fn unmodeled_response_fields_become_additional_info() {
        let response = TokenResponse::from_json(
            r#"{"access_token":"at","refresh_in":1800,"spa_code":"abc"}"#,
        )
        .unwrap();
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        let info = base.additional_info().unwrap();
        assert_eq!(info["refresh_in"], 1800);
        assert_eq!(info["spa_code"], "abc");
    }

    #[test]
    fn response_fields_named_like_modeled_keys_are_dropped() {
        let response = TokenResponse::from_json(
            r#"{"refresh_token":"rt","username":42,"family_id":"9","credential_type":"Password","x_extra":true}"#,
        )
        .unwrap();
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        let info = base.additional_info().unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info["x_extra"], true);
    }

    #[test]
    fn finish_dictionary_never_writes_modeled_keys() {
        let base = BaseCacheItem::from_response(&TokenResponse::default(), &params())
            .unwrap()
            .with_additional_info(Some(serde_json::Map::from_iter([
                ("username".to_owned(), serde_json::Value::from("mallory")),
                ("x_extra".to_owned(), serde_json::Value::from(1)),
            ])));
        let map = base.finish_dictionary(base.dictionary_head("RefreshToken"));
        assert!(map.get("username").is_none());
        assert_eq!(map["x_extra"], 1);
    }

    #[test]
    fn equality_ignores_username_and_additional_info() {
        let a = BaseCacheItem::from_response(
            &response_with(|r| r.client_info = Some(ClientInfo::encode("U1", "T1"))),
            &params(),
        )
        .unwrap();
        let b = a
            .clone()
            .with_additional_info(Some(serde_json::Map::from_iter([(
                "extra".to_owned(),
                serde_json::Value::from(true),
            )])));
        assert_eq!(a, b);

        let renamed = BaseCacheItem::from_response(
            &response_with(|r| {
                r.client_info = Some(ClientInfo::encode("U1", "T1"));
                r.id_token_claims = Some(IdTokenClaims {
                    email: Some("alice@mail.contoso.com".into()),
                    ..Default::default()
                });
            }),
            &params(),
        )
        .unwrap();
        assert_eq!(a.username(), None);
        assert_eq!(a, renamed);
    }

    #[test]
    fn equality_uses_normalized_authority_client_and_user() {
        let response = response_with(|r| r.client_info = Some(ClientInfo::encode("U1", "T1")));
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();

        let mut shouting = params();
        shouting.authority = Some("HTTPS://LOGIN.example.com:443/common/".into());
        assert_eq!(base, BaseCacheItem::from_response(&response, &shouting).unwrap());

        let mut other_client = params();
        other_client.client_id = Some("app2".into());
        assert_ne!(base, BaseCacheItem::from_response(&response, &other_client).unwrap());

        let other_user = response_with(|r| r.client_info = Some(ClientInfo::encode("U2", "T1")));
        assert_ne!(base, BaseCacheItem::from_response(&other_user, &params()).unwrap());

        assert_ne!(base, base.clone().without_user());
    }

    #[test]
    fn dictionary_head_round_trips_through_reader() {
        let response = response_with(|r| {
            r.client_info = Some(ClientInfo::encode("U1", "T1"));
            r.id_token_claims = Some(IdTokenClaims {
                upn: Some("alice@contoso.com".into()),
                ..Default::default()
            });
        });
        let base = BaseCacheItem::from_response(&response, &params()).unwrap();
        let head = base.dictionary_head("Account");
        assert_eq!(head["credential_type"], "Account");

        let mut reader = FieldReader::new(head);
        reader.expect_type_tag("Account").unwrap();
        let read = BaseCacheItem::read(&mut reader).unwrap();
        assert!(reader.into_remaining().is_none());
        assert_eq!(read, base);
        assert_eq!(read.username(), Some("alice@contoso.com"));
        assert_eq!(read.client_info(), base.client_info());
    }
}
