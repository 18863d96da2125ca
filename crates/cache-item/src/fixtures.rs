//! Shared test fixtures

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use crate::client_info::ClientInfo;
use crate::dictionary::Dictionary;
use crate::token::{RequestParameters, TokenResponse};

/// Fixed "now" for items built in tests.
pub(crate) const NOW: u64 = 1_700_000_000;

/// Unsigned compact JWT carrying `claims`.
pub(crate) fn jwt(claims: Value) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
    )
}

pub(crate) fn params() -> RequestParameters {
    RequestParameters::new("https://login.example.com/common", "app1")
}

/// Empty response customized by `f`.
pub(crate) fn response_with(f: impl FnOnce(&mut TokenResponse)) -> TokenResponse {
    let mut response = TokenResponse::default();
    f(&mut response);
    response
}

/// A response carrying every artifact.
pub(crate) fn full_response() -> TokenResponse {
    response_with(|r| {
        r.access_token = Some("at_secret".into());
        r.refresh_token = Some("rt_secret".into());
        r.id_token = Some(jwt(json!({
            "preferred_username": "alice@contoso.com",
            "given_name": "Alice",
            "family_name": "Liddell",
            "oid": "00000000-0000-0000-0000-00000000a11c",
            "tid": "T1",
        })));
        r.client_info = Some(ClientInfo::encode("U1", "T1"));
        r.scope = Some("user.read mail.read".into());
        r.token_type = Some("Bearer".into());
        r.expires_in = Some(3600);
        r.ext_expires_in = Some(7200);
        r.foci = Some("1".into());
    })
}

/// Unwrap a `json!` object literal.
pub(crate) fn dictionary(value: Value) -> Dictionary {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object: {other}"),
    }
}
