//! Account cache item
//!
//! One account per user per environment per realm. Display names and the
//! local account id are refreshed from the latest ID token and are not part
//! of identity.

use crate::base::BaseCacheItem;
use crate::constants::{keys, tags};
use crate::dictionary::{Dictionary, FieldReader, insert_opt_str, insert_str};
use crate::error::Result;
use crate::record::CacheRecord;
use crate::token::{RequestParameters, TokenResponse};

#[derive(Debug, Clone)]
pub struct Account {
    base: BaseCacheItem,
    home_account_id: String,
    environment: String,
    realm: String,
    given_name: Option<String>,
    family_name: Option<String>,
    local_account_id: Option<String>,
}

impl Account {
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let base = BaseCacheItem::from_response(response, params)?;
        Ok(Self::from_parts(base, response))
    }

    pub fn from_parts(base: BaseCacheItem, response: &TokenResponse) -> Self {
        let claims = response.claims().unwrap_or_default();
        Self {
            home_account_id: base.unique_user_id(),
            environment: base.environment(),
            realm: base.tenant(),
            local_account_id: claims.local_account_id().map(str::to_owned),
            given_name: claims.given_name,
            family_name: claims.family_name,
            base,
        }
    }

    /// `"<uid>.<utid>"` of the user's home tenant, or `""`.
    pub fn home_account_id(&self) -> &str {
        &self.home_account_id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    pub fn local_account_id(&self) -> Option<&str> {
        self.local_account_id.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.base.username()
    }
}

impl CacheRecord for Account {
    const TYPE_TAG: &'static str = tags::ACCOUNT;

    fn base(&self) -> &BaseCacheItem {
        &self.base
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut map = self.base.dictionary_head(Self::TYPE_TAG);
        insert_str(&mut map, keys::HOME_ACCOUNT_ID, self.home_account_id.as_str());
        insert_str(&mut map, keys::ENVIRONMENT, self.environment.as_str());
        insert_str(&mut map, keys::REALM, self.realm.as_str());
        insert_opt_str(&mut map, keys::GIVEN_NAME, self.given_name.as_deref());
        insert_opt_str(&mut map, keys::FAMILY_NAME, self.family_name.as_deref());
        insert_opt_str(&mut map, keys::LOCAL_ACCOUNT_ID, self.local_account_id.as_deref());
        self.base.finish_dictionary(map)
    }

    fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let mut fields = FieldReader::new(fields);
        fields.expect_type_tag(Self::TYPE_TAG)?;
        let base = BaseCacheItem::read(&mut fields)?;

        let home_account_id = fields
            .optional_str(keys::HOME_ACCOUNT_ID)?
            .unwrap_or_else(|| base.unique_user_id());
        let environment = fields
            .optional_str(keys::ENVIRONMENT)?
            .unwrap_or_else(|| base.environment());
        let realm = fields
            .optional_str(keys::REALM)?
            .unwrap_or_else(|| base.tenant());
        let given_name = fields.optional_str(keys::GIVEN_NAME)?;
        let family_name = fields.optional_str(keys::FAMILY_NAME)?;
        let local_account_id = fields.optional_str(keys::LOCAL_ACCOUNT_ID)?;

        Ok(Self {
            base: base.with_additional_info(fields.into_remaining()),
            home_account_id,
            environment,
            realm,
            given_name,
            family_name,
            local_account_id,
        })
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.home_account_id == other.home_account_id
            && self.environment == other.environment
            && self.realm == other.realm
    }
}

impl Eq for Account {}
