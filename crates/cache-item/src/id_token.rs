//! ID token cache item

use common::Secret;

use crate::base::BaseCacheItem;
use crate::constants::{keys, tags};
use crate::dictionary::{Dictionary, FieldReader, insert_str};
use crate::error::{Error, Result};
use crate::record::CacheRecord;
use crate::token::{IdTokenClaims, RequestParameters, TokenResponse};

/// The raw ID token of one user for one client, per realm.
#[derive(Debug, Clone)]
pub struct IdToken {
    base: BaseCacheItem,
    raw_token: Secret<String>,
    realm: String,
}

impl IdToken {
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let base = BaseCacheItem::from_response(response, params)?;
        Self::from_parts(base, response)
    }

    pub fn from_parts(base: BaseCacheItem, response: &TokenResponse) -> Result<Self> {
        let raw = response
            .id_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Construction("token response carries no id_token".into()))?;

        Ok(Self {
            realm: base.tenant(),
            base,
            raw_token: Secret::from(raw),
        })
    }

    pub fn raw_token(&self) -> &Secret<String> {
        &self.raw_token
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Claims decoded from the stored token, unverified.
    pub fn claims(&self) -> Option<IdTokenClaims> {
        IdTokenClaims::from_jwt(self.raw_token.expose())
    }
}

impl CacheRecord for IdToken {
    const TYPE_TAG: &'static str = tags::ID_TOKEN;

    fn base(&self) -> &BaseCacheItem {
        &self.base
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut map = self.base.dictionary_head(Self::TYPE_TAG);
        insert_str(&mut map, keys::SECRET, self.raw_token.expose().as_str());
        insert_str(&mut map, keys::REALM, self.realm.as_str());
        self.base.finish_dictionary(map)
    }

    fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let mut fields = FieldReader::new(fields);
        fields.expect_type_tag(Self::TYPE_TAG)?;
        let base = BaseCacheItem::read(&mut fields)?;
        let raw_token = fields.required_str(keys::SECRET)?;
        let realm = fields
            .optional_str(keys::REALM)?
            .unwrap_or_else(|| base.tenant());

        Ok(Self {
            base: base.with_additional_info(fields.into_remaining()),
            raw_token: Secret::new(raw_token),
            realm,
        })
    }
}

impl PartialEq for IdToken {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.realm == other.realm
    }
}

impl Eq for IdToken {}
