//! Application metadata cache item
//!
//! Records which client family an application belongs to. It describes the
//! app, not a user, so its envelope carries no client info or username.

use crate::base::BaseCacheItem;
use crate::constants::{keys, tags};
use crate::dictionary::{Dictionary, FieldReader, insert_opt_str, insert_str};
use crate::error::Result;
use crate::record::CacheRecord;
use crate::token::{RequestParameters, TokenResponse};

#[derive(Debug, Clone)]
pub struct AppMetadata {
    base: BaseCacheItem,
    environment: String,
    client_family_id: Option<String>,
}

impl AppMetadata {
    pub fn from_response(response: &TokenResponse, params: &RequestParameters) -> Result<Self> {
        let base = BaseCacheItem::from_response(response, params)?;
        Ok(Self::from_parts(base, response))
    }

    pub fn from_parts(base: BaseCacheItem, response: &TokenResponse) -> Self {
        let base = base.without_user();
        Self {
            environment: base.environment(),
            client_family_id: response.foci.clone().filter(|f| !f.is_empty()),
            base,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn client_family_id(&self) -> Option<&str> {
        self.client_family_id.as_deref()
    }
}

impl CacheRecord for AppMetadata {
    const TYPE_TAG: &'static str = tags::APP_METADATA;

    fn base(&self) -> &BaseCacheItem {
        &self.base
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut map = self.base.dictionary_head(Self::TYPE_TAG);
        insert_str(&mut map, keys::ENVIRONMENT, self.environment.as_str());
        insert_opt_str(&mut map, keys::FAMILY_ID, self.client_family_id.as_deref());
        self.base.finish_dictionary(map)
    }

    fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let mut fields = FieldReader::new(fields);
        fields.expect_type_tag(Self::TYPE_TAG)?;
        let base = BaseCacheItem::read(&mut fields)?;
        let environment = fields
            .optional_str(keys::ENVIRONMENT)?
            .unwrap_or_else(|| base.environment());
        let client_family_id = fields
            .optional_str(keys::FAMILY_ID)?
            .filter(|f| !f.is_empty());

        Ok(Self {
            base: base.with_additional_info(fields.into_remaining()),
            environment,
            client_family_id,
        })
    }
}

impl PartialEq for AppMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.environment == other.environment
    }
}

impl Eq for AppMetadata {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{full_response, params, response_with};

    #[test]
    fn strips_user_identity() {
        let meta = AppMetadata::from_response(&full_response(), &params()).unwrap();
        assert_eq!(meta.base().unique_user_id(), "");
        assert_eq!(meta.base().username(), None);
        assert_eq!(meta.client_family_id(), Some("1"));
        assert_eq!(meta.environment(), "login.example.com");
    }

    #[test]
    fn one_slot_per_app_regardless_of_user() {
        let alice = AppMetadata::from_response(&full_response(), &params()).unwrap();
        let bob = AppMetadata::from_response(
            &response_with(|r| {
                r.client_info = Some(crate::ClientInfo::encode("U2", "T2"));
            }),
            &params(),
        )
        .unwrap();
        assert_eq!(alice, bob);
        assert_eq!(bob.client_family_id(), None);
    }

    #[test]
    fn round_trips() {
        let meta = AppMetadata::from_response(&full_response(), &params()).unwrap();
        let from_dict = AppMetadata::from_dictionary(meta.to_dictionary()).unwrap();
        assert_eq!(from_dict, meta);
        assert_eq!(from_dict.client_family_id(), Some("1"));

        let from_archive =
            AppMetadata::from_secure_archive(&meta.to_secure_archive().unwrap()).unwrap();
        assert_eq!(from_archive.to_dictionary(), meta.to_dictionary());
    }
}
