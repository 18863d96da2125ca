//! Authority comparison
//!
//! Authorities reach the cache already alias-resolved; this module only
//! decides when two of them name the same cache slot. The canonical form is
//! `scheme://host[:port]/path` with scheme and host lowercased, the default
//! port elided, query and fragment dropped and trailing slashes trimmed.
//! Path case is preserved: tenant names are case-significant upstream.

use url::Url;

/// Parse an authority. Only absolute URLs with a host qualify.
pub fn parse(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return None;
    }
    Some(url)
}

/// Canonical string form used for equality and cache keys.
pub fn normalize(authority: &Url) -> String {
    // The parser already lowercases scheme and host and drops default ports.
    let host = authority.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = authority
        .port()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();
    let path = authority.path().trim_end_matches('/');
    format!("{}://{host}{port}{path}", authority.scheme())
}

pub fn same_authority(a: &Url, b: &Url) -> bool {
    normalize(a) == normalize(b)
}

/// Host name of the authority, e.g. `login.example.com`.
pub fn environment(authority: &Url) -> String {
    authority.host_str().unwrap_or_default().to_ascii_lowercase()
}

/// First path segment of the authority, e.g. `common` or a tenant id.
pub fn tenant(authority: &Url) -> Option<String> {
    authority
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_owned)
}
