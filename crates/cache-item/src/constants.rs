//! Persisted format constants
//!
//! Every name here is read by other processes sharing the same store.
//! Renaming one is a format break, not a refactor.

/// Dictionary key names, schema v1.
pub mod keys {
    pub const CREDENTIAL_TYPE: &str = "credential_type";
    pub const AUTHORITY: &str = "authority";
    pub const CLIENT_ID: &str = "client_id";
    pub const CLIENT_INFO: &str = "client_info";
    pub const USERNAME: &str = "username";

    pub const SECRET: &str = "secret";
    pub const TARGET: &str = "target";
    pub const TOKEN_TYPE: &str = "token_type";
    pub const REALM: &str = "realm";
    pub const CACHED_AT: &str = "cached_at";
    pub const EXPIRES_ON: &str = "expires_on";
    pub const EXTENDED_EXPIRES_ON: &str = "extended_expires_on";

    pub const FAMILY_ID: &str = "family_id";

    pub const HOME_ACCOUNT_ID: &str = "home_account_id";
    pub const ENVIRONMENT: &str = "environment";
    pub const GIVEN_NAME: &str = "given_name";
    pub const FAMILY_NAME: &str = "family_name";
    pub const LOCAL_ACCOUNT_ID: &str = "local_account_id";

    /// Every modeled key. Response fields with these names are never
    /// carried as additional info.
    pub const ALL: &[&str] = &[
        CREDENTIAL_TYPE,
        AUTHORITY,
        CLIENT_ID,
        CLIENT_INFO,
        USERNAME,
        SECRET,
        TARGET,
        TOKEN_TYPE,
        REALM,
        CACHED_AT,
        EXPIRES_ON,
        EXTENDED_EXPIRES_ON,
        FAMILY_ID,
        HOME_ACCOUNT_ID,
        ENVIRONMENT,
        GIVEN_NAME,
        FAMILY_NAME,
        LOCAL_ACCOUNT_ID,
    ];

    /// Whether `key` names a modeled dictionary field.
    pub fn is_reserved(key: &str) -> bool {
        ALL.contains(&key)
    }
}

/// Type tags, written as `credential_type` in dictionaries and as the
/// archive envelope tag.
pub mod tags {
    pub const ACCESS_TOKEN: &str = "AccessToken";
    pub const REFRESH_TOKEN: &str = "RefreshToken";
    pub const ID_TOKEN: &str = "IdToken";
    pub const ACCOUNT: &str = "Account";
    pub const APP_METADATA: &str = "AppMetadata";
}

/// Leading bytes of every secure archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"CCAR";

/// Format version written by this build.
pub const ARCHIVE_FORMAT_VERSION: u16 = 1;

/// Format versions this build can read.
pub const SUPPORTED_ARCHIVE_VERSIONS: &[u16] = &[1];

/// Access token lifetime assumed when a response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;
