//! Closed union over every cache item variant
//!
//! Wherever "any cache item" has to be held (a store slot, a loader's
//! output) it is a `CacheItem`. Decoding picks the variant from the tag the
//! record carries, through an explicit tag-to-decoder table.

use serde_json::Value;
use tracing::debug;

use crate::access_token::AccessToken;
use crate::account::Account;
use crate::app_metadata::AppMetadata;
use crate::archive;
use crate::base::BaseCacheItem;
use crate::constants::{keys, tags};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::id_token::IdToken;
use crate::record::CacheRecord;
use crate::refresh_token::RefreshToken;
use crate::token::{RequestParameters, TokenResponse};

/// Any cache item. Items of different variants never compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheItem {
    AccessToken(AccessToken),
    RefreshToken(RefreshToken),
    IdToken(IdToken),
    Account(Account),
    AppMetadata(AppMetadata),
}

type Decoder = fn(Dictionary) -> Result<CacheItem>;

fn decode_as<T>(fields: Dictionary) -> Result<CacheItem>
where
    T: CacheRecord + Into<CacheItem>,
{
    T::from_dictionary(fields).map(Into::into)
}

const DECODERS: [(&str, Decoder); 5] = [
    (tags::ACCESS_TOKEN, decode_as::<AccessToken> as Decoder),
    (tags::REFRESH_TOKEN, decode_as::<RefreshToken> as Decoder),
    (tags::ID_TOKEN, decode_as::<IdToken> as Decoder),
    (tags::ACCOUNT, decode_as::<Account> as Decoder),
    (tags::APP_METADATA, decode_as::<AppMetadata> as Decoder),
];

fn decoder_for(tag: &str) -> Result<Decoder> {
    DECODERS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|&(_, decoder)| decoder)
        .ok_or_else(|| Error::Parse(format!("unknown cache item type `{tag}`")))
}

impl CacheItem {
    /// Build every item a token response yields.
    ///
    /// Access, refresh and ID tokens are included when the response carries
    /// them; an account when it identifies a user; app metadata always. The
    /// envelope is built once, so an unusable authority or client id fails
    /// the whole call before any item exists.
    pub fn from_response(
        response: &TokenResponse,
        params: &RequestParameters,
    ) -> Result<Vec<CacheItem>> {
        let base = BaseCacheItem::from_response(response, params)?;
        let now = crate::now_secs();
        let present = |token: &Option<String>| token.as_deref().is_some_and(|t| !t.is_empty());

        let mut items = Vec::with_capacity(5);
        if present(&response.access_token) {
            items.push(AccessToken::from_parts(base.clone(), response, now)?.into());
        }
        if present(&response.refresh_token) {
            items.push(RefreshToken::from_parts(base.clone(), response)?.into());
        }
        if present(&response.id_token) {
            items.push(IdToken::from_parts(base.clone(), response)?.into());
        }
        if base.client_info().is_some() || response.claims().is_some() {
            items.push(Account::from_parts(base.clone(), response).into());
        }
        items.push(AppMetadata::from_parts(base, response).into());

        debug!(
            correlation_id = ?params.correlation_id,
            items = items.len(),
            "built cache items from token response"
        );
        Ok(items)
    }

    /// Tag of the concrete variant.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::AccessToken(_) => AccessToken::TYPE_TAG,
            Self::RefreshToken(_) => RefreshToken::TYPE_TAG,
            Self::IdToken(_) => IdToken::TYPE_TAG,
            Self::Account(_) => Account::TYPE_TAG,
            Self::AppMetadata(_) => AppMetadata::TYPE_TAG,
        }
    }

    pub fn base(&self) -> &BaseCacheItem {
        match self {
            Self::AccessToken(item) => item.base(),
            Self::RefreshToken(item) => item.base(),
            Self::IdToken(item) => item.base(),
            Self::Account(item) => item.base(),
            Self::AppMetadata(item) => item.base(),
        }
    }

    pub fn to_dictionary(&self) -> Dictionary {
        match self {
            Self::AccessToken(item) => item.to_dictionary(),
            Self::RefreshToken(item) => item.to_dictionary(),
            Self::IdToken(item) => item.to_dictionary(),
            Self::Account(item) => item.to_dictionary(),
            Self::AppMetadata(item) => item.to_dictionary(),
        }
    }

    /// Decode a dictionary whose `credential_type` names the variant.
    pub fn from_dictionary(fields: Dictionary) -> Result<Self> {
        let tag = match fields.get(keys::CREDENTIAL_TYPE) {
            Some(Value::String(tag)) => tag.clone(),
            _ => {
                return Err(Error::Parse(format!(
                    "missing required key `{}`",
                    keys::CREDENTIAL_TYPE
                )));
            }
        };
        decoder_for(&tag)?(fields)
    }

    pub fn to_secure_archive(&self) -> Result<Vec<u8>> {
        archive::encode(self.type_tag(), self.to_dictionary())
    }

    /// Decode an archive of any variant, chosen by its embedded type tag.
    pub fn from_secure_archive(bytes: &[u8]) -> Result<Self> {
        let archive = archive::decode(bytes)?;
        decoder_for(&archive.type_tag)?(archive.payload)
    }
}

impl From<AccessToken> for CacheItem {
    fn from(item: AccessToken) -> Self {
        Self::AccessToken(item)
    }
}

impl From<RefreshToken> for CacheItem {
    fn from(item: RefreshToken) -> Self {
        Self::RefreshToken(item)
    }
}

impl From<IdToken> for CacheItem {
    fn from(item: IdToken) -> Self {
        Self::IdToken(item)
    }
}

impl From<Account> for CacheItem {
    fn from(item: Account) -> Self {
        Self::Account(item)
    }
}

impl From<AppMetadata> for CacheItem {
    fn from(item: AppMetadata) -> Self {
        Self::AppMetadata(item)
    }
}
