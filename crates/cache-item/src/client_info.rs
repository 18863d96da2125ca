//! Client info claim decoding
//!
//! `client_info` is base64url text (padding optional) over a JSON object
//! carrying `uid` and `utid`. Together they identify one user in one tenant
//! and form the unique user id every cache key is scoped by.
//!
//! Decoding never fails: a response with an unreadable claim must still be
//! cacheable, so malformed input yields `None` (an empty identity bucket)
//! and a warning.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};
use tracing::warn;

/// base64url decoder accepting both padded and unpadded input.
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded client info claim.
///
/// Keeps the raw claim so the envelope can persist exactly what the server
/// sent and re-derive the same identity after a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    raw: String,
    uid: Option<String>,
    utid: Option<String>,
}

impl ClientInfo {
    /// Decode a raw `client_info` claim.
    ///
    /// Returns `None` for empty input, invalid base64url, or a payload that
    /// is not a JSON object. An object missing `uid` or `utid` still decodes;
    /// its unique user id falls back to the raw claim.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let bytes = match URL_SAFE_LENIENT.decode(raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(len = raw.len(), error = %e, "client_info is not base64url, using empty identity");
                return None;
            }
        };

        let object: Map<String, Value> = match serde_json::from_slice(&bytes) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!(len = raw.len(), "client_info is not a JSON object, using empty identity");
                return None;
            }
            Err(e) => {
                warn!(len = raw.len(), error = %e, "client_info is not JSON, using empty identity");
                return None;
            }
        };

        let field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Some(Self {
            uid: field("uid"),
            utid: field("utid"),
            raw: raw.to_owned(),
        })
    }

    /// Encode a uid/utid pair the way a token endpoint would.
    pub fn encode(uid: &str, utid: &str) -> String {
        let json = serde_json::json!({ "uid": uid, "utid": utid });
        URL_SAFE_NO_PAD.encode(json.to_string())
    }

    /// The claim as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn utid(&self) -> Option<&str> {
        self.utid.as_deref()
    }

    /// `"<uid>.<utid>"` when both halves decoded, else the raw claim.
    pub fn unique_user_id(&self) -> String {
        match (&self.uid, &self.utid) {
            (Some(uid), Some(utid)) => format!("{uid}.{utid}"),
            _ => self.raw.clone(),
        }
    }
}

/// Unique user id of an optional claim; the empty identity maps to `""`.
pub fn unique_user_id(client_info: Option<&ClientInfo>) -> String {
    client_info.map(ClientInfo::unique_user_id).unwrap_or_default()
}
