//! Token cache inspector
//!
//! Loads a token cache file and prints one JSON line per cached item to
//! stdout. Unreadable records are skipped and counted in the summary log.

mod config;
mod report;

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_store::CacheStore;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays one JSON document per line
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_config = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config);
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    info!(
        config = %config_path.display(),
        store = %config.store.path.display(),
        "Inspecting token cache"
    );

    let store = open_store(&config.store.path).await?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut entries = store.entries().await;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut expired = 0usize;
    for (key, item) in &entries {
        let line = report::describe(key, item, now, config.report.expiry_window_secs);
        if line["expired"] == true {
            expired += 1;
        }
        println!("{line}");
    }

    if store.skipped() > 0 {
        warn!(skipped = store.skipped(), "Some cache records could not be read");
    }
    info!(
        items = entries.len(),
        skipped = store.skipped(),
        expired_access_tokens = expired,
        "Token cache inspected"
    );

    Ok(())
}

/// Open an existing cache file. A missing file is an error here: the
/// inspector never creates one.
async fn open_store(path: &Path) -> Result<CacheStore> {
    if !path.exists() {
        bail!("token cache {} does not exist", path.display());
    }
    CacheStore::load(path.to_path_buf())
        .await
        .with_context(|| format!("loading token cache {}", path.display()))
}
