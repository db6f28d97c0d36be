//! File-backed cache store
//!
//! Keeps a JSON file mapping cache keys to values with an optional absolute
//! expiry (unix seconds). All writes use atomic temp-file + rename to prevent
//! corruption on crash, and a tokio Mutex serializes concurrent writers in the
//! same process. Expired entries read as missing and are pruned on the next write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::{CacheFuture, CacheStore};

/// A persisted cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub value: String,
    /// Expiration as unix timestamp in seconds; `None` never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl FileEntry {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// JSON file cache shared by every platform identity pointed at the same path.
pub struct FileCache {
    path: PathBuf,
    state: Mutex<HashMap<String, FileEntry>>,
}

impl FileCache {
    /// Load the cache from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}`.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading cache file: {e}")))?;
            let entries: HashMap<String, FileEntry> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing cache file: {e}")))?;
            info!(path = %path.display(), entries = entries.len(), "loaded cache file");
            entries
        } else {
            info!(path = %path.display(), "cache file not found, starting empty");
            let entries = HashMap::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for FileCache {
    fn fetch<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let now = unix_now();
            Ok(state
                .get(key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.value.clone()))
        })
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let now = unix_now();
            state.retain(|_, entry| entry.is_live(now));
            let expires_at = ttl.and_then(|ttl| now.checked_add(ttl.as_secs()));
            state.insert(key.to_owned(), FileEntry { value, expires_at });
            debug!(key, ?expires_at, "saved cache entry");
            write_atomic(&self.path, &state).await
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let Some(removed) = state.remove(key) else {
                return Ok(false);
            };
            debug!(key, "deleted cache entry");
            write_atomic(&self.path, &state).await?;
            Ok(removed.is_live(unix_now()))
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Write the cache map to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since
/// the file holds access tokens.
async fn write_atomic(path: &Path, data: &HashMap<String, FileEntry>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing cache: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("cache path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".cache.tmp.{}", std::process::id()));

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

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp cache file: {e}")))?;

    debug!(path = %path.display(), "persisted cache");
    Ok(())
}
