//! Serialization protocol shared by every cache item variant

use crate::archive;
use crate::base::BaseCacheItem;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};

/// A persisted cache record.
///
/// Implementors provide the dictionary form; the secure archive form is
/// derived from it. `from_dictionary` failures are per record: a loader
/// drops the record and keeps going.
pub trait CacheRecord: Sized {
    /// Tag written as `credential_type` and into archive envelopes.
    const TYPE_TAG: &'static str;

    /// The shared envelope.
    fn base(&self) -> &BaseCacheItem;

    fn to_dictionary(&self) -> Dictionary;

    fn from_dictionary(fields: Dictionary) -> Result<Self>;

    fn to_secure_archive(&self) -> Result<Vec<u8>> {
        archive::encode(Self::TYPE_TAG, self.to_dictionary())
    }

    /// Decode an archive that must hold this variant.
    ///
    /// Use `CacheItem::from_secure_archive` when the variant is not known
    /// up front.
    fn from_secure_archive(bytes: &[u8]) -> Result<Self> {
        let archive = archive::decode(bytes)?;
        if archive.type_tag != Self::TYPE_TAG {
            return Err(Error::Parse(format!(
                "archive holds `{}`, expected `{}`",
                archive.type_tag,
                Self::TYPE_TAG
            )));
        }
        Self::from_dictionary(archive.payload)
    }
}
