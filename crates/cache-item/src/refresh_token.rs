//! Refresh token cache item
//!
//! A refresh token issued to a client family (`foci`) can be redeemed by
//! any member of that family, so the family id is part of its identity.

use common::Secret;

use crate::base::BaseCacheItem;
use crate::constants::{keys, tags};
use crate::dictionary::{Dictionary, FieldReader, insert_opt_str, insert_str};
use crate::error::{Error, Result};
use crate::record::CacheRecord;
use crate::token::{RequestParameters, TokenResponse};

#[derive(Debug, Clone)]
pub struct RefreshToken {
    base: BaseCacheItem,
    secret: Secret<String>,
    family_id: Option<String>,
}

impl RefreshToken {
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let base = BaseCacheItem::from_response(response, params)?;
        Self::from_parts(base, response)
    }

    pub fn from_parts(base: BaseCacheItem, response: &TokenResponse) -> Result<Self> {
        let secret = response
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Construction("token response carries no refresh_token".into()))?;

        Ok(Self {
            base,
            secret: Secret::from(secret),
            family_id: response.foci.clone().filter(|f| !f.is_empty()),
        })
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub fn family_id(&self) -> Option<&str> {
        self.family_id.as_deref()
    }

    /// Whether this token is shared across a client family.
    pub fn is_family_refresh_token(&self) -> bool {
        self.family_id.is_some()
    }
}

impl CacheRecord for RefreshToken {
    const TYPE_TAG: &'static str = tags::REFRESH_TOKEN;

    fn base(&self) -> &BaseCacheItem {
        &self.base
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut map = self.base.dictionary_head(Self::TYPE_TAG);
        insert_str(&mut map, keys::SECRET, self.secret.expose().as_str());
        insert_opt_str(&mut map, keys::FAMILY_ID, self.family_id.as_deref());
        self.base.finish_dictionary(map)
    }

    fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let mut fields = FieldReader::new(fields);
        fields.expect_type_tag(Self::TYPE_TAG)?;
        let base = BaseCacheItem::read(&mut fields)?;
        let secret = fields.required_str(keys::SECRET)?;
        let family_id = fields
            .optional_str(keys::FAMILY_ID)?
            .filter(|f| !f.is_empty());

        Ok(Self {
            base: base.with_additional_info(fields.into_remaining()),
            secret: Secret::new(secret),
            family_id,
        })
    }
}

impl PartialEq for RefreshToken {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.family_id == other.family_id
    }
}

impl Eq for RefreshToken {}
