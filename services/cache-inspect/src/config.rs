//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! `CACHE_STORE_PATH` overrides `store.path` so the same config can be
//! pointed at another cache file without editing it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Token cache file location
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Report settings
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Access tokens expiring within this many seconds are flagged
    #[serde(default = "default_expiry_window")]
    pub expiry_window_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            expiry_window_secs: default_expiry_window(),
        }
    }
}

fn default_expiry_window() -> u64 {
    300
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| common::Error::read(path, e))?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(store_path) = std::env::var("CACHE_STORE_PATH") {
            config.store.path = PathBuf::from(store_path);
        }

        if config.store.path.as_os_str().is_empty() {
            return Err(common::Error::Config("store.path must not be empty".into()));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("cache-inspect.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("cache-inspect.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_valid_config_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CACHE_STORE_PATH") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[store]
path = "/var/lib/app/token-cache.json"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.store.path,
            PathBuf::from("/var/lib/app/token-cache.json")
        );
        assert_eq!(config.report.expiry_window_secs, 300);
    }

    #[test]
    fn load_custom_expiry_window() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CACHE_STORE_PATH") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[store]
path = "cache.json"

[report]
expiry_window_secs = 60
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.report.expiry_window_secs, 60);
    }

    #[test]
    fn env_overrides_store_path() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[store]\npath = \"from-file.json\"\n");

        unsafe { set_env("CACHE_STORE_PATH", "/from/env.json") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("CACHE_STORE_PATH") };

        assert_eq!(config.store.path, PathBuf::from("/from/env.json"));
    }

    #[test]
    fn empty_store_path_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CACHE_STORE_PATH") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[store]\npath = \"\"\n");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, common::Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn missing_file_and_invalid_toml_fail() {
        assert!(matches!(
            Config::load(Path::new("/nonexistent/cache-inspect.toml")),
            Err(common::Error::Read { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();

        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/env/path.toml"));
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );

        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("cache-inspect.toml"));
    }
}
