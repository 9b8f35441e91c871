//! Persistent key/value cache for API responses.
//!
//! One file per entry under the cache directory, named by the MD5 of
//! the logical key:
//!
//! ```text
//! {cache_dir}/
//! ├── 0cc175b9c0f1b6a831c399e269772661.json
//! └── 92eb5ffee6ae2fec3ad71c777531578f.json
//! ```
//!
//! Each file holds a JSON envelope `{ key, expires_at, payload }`.
//! Entries expire lazily: an expired envelope is deleted on read and
//! reported as a miss. Writes are atomic (temp file + rename); there is
//! no cross-process locking, concurrent writers race and the last
//! rename wins.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::utils::md5_hex;

/// On-disk envelope around a cached payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    key: String,
    expires_at: DateTime<Utc>,
    payload: T,
}

/// Key and expiry of a stored entry, for operator tooling.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

impl EntryInfo {
    /// Whether the entry has already passed its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// File-backed cache with per-entry time-to-live.
#[derive(Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Create a cache rooted at the given directory. The directory is
    /// created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", md5_hex(key)))
    }

    /// Look up a value. Expired entries are deleted and reported as a
    /// miss; unreadable entries are dropped the same way so one bad
    /// file never poisons a run.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("discarding unreadable cache entry for '{key}': {e}");
                tokio::fs::remove_file(&path).await.ok();
                return Ok(None);
            }
        };

        if envelope.expires_at <= Utc::now() {
            log::debug!("cache entry '{key}' expired, removing");
            tokio::fs::remove_file(&path).await.ok();
            return Ok(None);
        }

        Ok(Some(envelope.payload))
    }

    /// Store a value with the given time-to-live.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let envelope = Envelope {
            key: key.to_string(),
            expires_at: Utc::now() + ttl,
            payload: value,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Remove a single entry if present.
    pub async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Logical keys of all stored entries, expired ones included.
    pub async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries().await?.into_iter().map(|e| e.key).collect())
    }

    /// Key and expiry of every stored entry.
    pub async fn entries(&self) -> Result<Vec<EntryInfo>> {
        let mut infos = Vec::new();
        for path in self.entry_files().await? {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes) {
                Ok(envelope) => infos.push(EntryInfo {
                    key: envelope.key,
                    expires_at: envelope.expires_at,
                }),
                Err(e) => log::warn!("skipping unreadable cache file {}: {e}", path.display()),
            }
        }
        Ok(infos)
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(AppError::Io(e)),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}
