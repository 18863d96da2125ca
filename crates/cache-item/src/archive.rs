//! Secure archive encoding
//!
//! Layout:
//!
//! ```text
//! +------+---------+-------------------------------------------+
//! | CCAR | version | {"type_tag": "...", "payload": {...}}     |
//! | 4 B  | u16 BE  | JSON envelope holding the dictionary form |
//! +------+---------+-------------------------------------------+
//! ```
//!
//! The version is checked before the envelope is parsed. Versions this
//! build does not list in `SUPPORTED_ARCHIVE_VERSIONS` are rejected, never
//! migrated.

use serde::{Deserialize, Serialize};

use crate::constants::{ARCHIVE_FORMAT_VERSION, ARCHIVE_MAGIC, SUPPORTED_ARCHIVE_VERSIONS};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};

const HEADER_LEN: usize = ARCHIVE_MAGIC.len() + 2;

#[derive(Serialize, Deserialize)]
struct Envelope {
    type_tag: String,
    payload: Dictionary,
}

/// A decoded archive whose payload has not been interpreted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub format_version: u16,
    pub type_tag: String,
    pub payload: Dictionary,
}

/// Wrap a dictionary in the current archive format.
pub fn encode(type_tag: &str, payload: Dictionary) -> Result<Vec<u8>> {
    let envelope = Envelope {
        type_tag: type_tag.to_owned(),
        payload,
    };
    let body = serde_json::to_vec(&envelope)
        .map_err(|e| Error::Encode(format!("serializing archive envelope: {e}")))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(&ARCHIVE_MAGIC);
    bytes.extend_from_slice(&ARCHIVE_FORMAT_VERSION.to_be_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Unwrap an archive, checking magic and version.
pub fn decode(bytes: &[u8]) -> Result<Archive> {
    let (magic, rest) = bytes
        .split_first_chunk::<4>()
        .ok_or_else(|| Error::Parse(format!("archive truncated at {} bytes", bytes.len())))?;
    if *magic != ARCHIVE_MAGIC {
        return Err(Error::Parse("archive magic mismatch".into()));
    }

    let (version, body) = rest
        .split_first_chunk::<2>()
        .ok_or_else(|| Error::Parse(format!("archive truncated at {} bytes", bytes.len())))?;
    let format_version = u16::from_be_bytes(*version);
    if !SUPPORTED_ARCHIVE_VERSIONS.contains(&format_version) {
        return Err(Error::UnsupportedVersion {
            found: format_version,
            supported: SUPPORTED_ARCHIVE_VERSIONS,
        });
    }

    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| Error::Parse(format!("archive envelope: {e}")))?;

    Ok(Archive {
        format_version,
        type_tag: envelope.type_tag,
        payload: envelope.payload,
    })
}
