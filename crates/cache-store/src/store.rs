//! Persistent cache slots
//!
//! The cache file is a JSON object mapping cache keys to base64-encoded
//! secure archives. All writes use atomic temp-file + rename to prevent
//! corruption on crash. A tokio Mutex serializes slot replacement; items
//! are immutable, so reads clone them out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cache_item::CacheItem;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::key::cache_key;

/// File-backed cache of `CacheItem`s keyed by identity.
pub struct CacheStore {
    path: PathBuf,
    state: Mutex<HashMap<String, CacheItem>>,
    skipped: usize,
}

impl CacheStore {
    /// Load the cache file at `path`.
    ///
    /// A missing file starts an empty cache and creates it as `{}`. Records
    /// that fail to decode are skipped and counted in `skipped()`; only a
    /// file that is not a JSON object of strings fails the load.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let (state, skipped) = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading cache file: {e}")))?;
            let records: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Corrupt(format!("parsing cache file: {e}")))?;

            let mut items = HashMap::with_capacity(records.len());
            let mut skipped = 0;
            for (stored_key, encoded) in records {
                match decode_record(&encoded) {
                    Ok(item) => {
                        let key = cache_key(&item);
                        if key != stored_key {
                            debug!(stored_key, key, "re-keyed cache record");
                        }
                        items.insert(key, item);
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(key = stored_key, error = %e, "skipping unreadable cache record");
                    }
                }
            }
            info!(path = %path.display(), items = items.len(), skipped, "loaded token cache");
            (items, skipped)
        } else {
            info!(path = %path.display(), "cache file not found, starting with empty cache");
            let items = HashMap::new();
            // Create the empty file so future loads don't need the cold-start path
            write_atomic(&path, &items).await?;
            (items, 0)
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
            skipped,
        })
    }

    /// Persist the current in-memory state to disk.
    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;
        write_atomic(&self.path, &state).await
    }

    /// Store `item` in its identity slot and persist.
    ///
    /// Returns the item it replaced, if any. If persisting fails the slot
    /// keeps its previous content.
    pub async fn put(&self, item: CacheItem) -> Result<Option<CacheItem>> {
        let key = cache_key(&item);
        let mut state = self.state.lock().await;
        let previous = state.insert(key.clone(), item);
        if let Err(e) = write_atomic(&self.path, &state).await {
            match previous {
                Some(previous) => state.insert(key, previous),
                None => state.remove(&key),
            };
            return Err(e);
        }
        debug!(key, replaced = previous.is_some(), "stored cache item");
        Ok(previous)
    }

    /// Store every item, persisting once. Nothing changes if persisting fails.
    pub async fn put_all(&self, items: impl IntoIterator<Item = CacheItem>) -> Result<()> {
        let mut state = self.state.lock().await;
        let snapshot = state.clone();
        for item in items {
            state.insert(cache_key(&item), item);
        }
        if let Err(e) = write_atomic(&self.path, &state).await {
            *state = snapshot;
            return Err(e);
        }
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Option<CacheItem> {
        let state = self.state.lock().await;
        state.get(key).cloned()
    }

    /// The stored item with the same identity as `item`.
    pub async fn find(&self, item: &CacheItem) -> Option<CacheItem> {
        self.get(&cache_key(item)).await
    }

    /// Remove a slot and persist. Returns the removed item if it existed.
    pub async fn remove(&self, key: &str) -> Result<Option<CacheItem>> {
        let mut state = self.state.lock().await;
        let Some(removed) = state.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = write_atomic(&self.path, &state).await {
            state.insert(key.to_owned(), removed);
            return Err(e);
        }
        debug!(key, "removed cache item");
        Ok(Some(removed))
    }

    pub async fn keys(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.keys().cloned().collect()
    }

    /// Snapshot of all items with their keys.
    pub async fn entries(&self) -> Vec<(String, CacheItem)> {
        let state = self.state.lock().await;
        state
            .iter()
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }

    pub async fn items(&self) -> Vec<CacheItem> {
        let state = self.state.lock().await;
        state.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Records dropped by the last load.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decode_record(encoded: &str) -> Result<CacheItem> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| Error::Corrupt(format!("record is not base64: {e}")))?;
    Ok(CacheItem::from_secure_archive(&bytes)?)
}

fn encode_record(item: &CacheItem) -> Result<String> {
    Ok(STANDARD.encode(item.to_secure_archive()?))
}

/// Distinguishes temp files of concurrent writes within one process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write the cache to a file atomically.
///
/// Writes to a temporary file in the same directory, named after the
/// target, then renames it over the target. Sets file permissions to 0600 (owner read/write only) since
/// the file contains tokens.
async fn write_atomic(path: &Path, items: &HashMap<String, CacheItem>) -> Result<()> {
    let records = items
        .iter()
        .map(|(key, item)| Ok((key.clone(), encode_record(item)?)))
        .collect::<Result<HashMap<String, String>>>()?;
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| Error::Corrupt(format!("serializing cache file: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("cache path has no parent directory".into()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Io("cache path has no file name".into()))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(
        ".{file_name}.tmp.{}.{}",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp cache file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting cache file permissions: {e}")))?;
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(Error::Io(format!("renaming temp cache file: {e}")));
    }

    debug!(path = %path.display(), items = items.len(), "persisted token cache");
    Ok(())
}
