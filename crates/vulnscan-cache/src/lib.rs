//! On-disk cache for vulnerability feed responses.
//!
//! Entries are integrity-stamped with a keyed HMAC over
//! `(feed, query, payload, fetched_at)`; a tampered or corrupted entry is
//! discarded and the caller re-issues the query live rather than trusting
//! bad data (`IntegrityError`). The cache directory is single-writer: an
//! exclusive file lock on the index serializes concurrent writers instead
//! of letting them corrupt the index.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache index corrupt: {0}")]
    Corrupt(String),
    #[error("cache entry failed integrity check for key {0}")]
    Integrity(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// The persisted unit behind a cached feed response, keyed by
/// `(feed_id, query_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub feed_id: String,
    pub query_key: String,
    pub payload: String,
    pub fetched_at: DateTime<Utc>,
    pub hmac: String,
}

/// Single-writer, HMAC-integrity on-disk cache rooted at a directory.
pub struct CacheStore {
    dir: PathBuf,
    key: Vec<u8>,
}

const INDEX_FILE: &str = "index.json";
const KEY_FILE: &str = ".hmac_key";

impl CacheStore {
    /// Opens (creating if absent) a cache rooted at `dir`. The HMAC key is
    /// generated once and persisted alongside the index; it never leaves
    /// the local cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let key_path = dir.join(KEY_FILE);
        let key = if key_path.exists() {
            fs::read(&key_path)?
        } else {
            let mut k = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut k);
            fs::write(&key_path, &k)?;
            k
        };
        Ok(Self { dir, key })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }

    fn sign(&self, feed_id: &str, query_key: &str, payload: &str, fetched_at: DateTime<Utc>) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(feed_id.as_bytes());
        mac.update(b"|");
        mac.update(query_key.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        mac.update(b"|");
        mac.update(fetched_at.to_rfc3339().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn entry_key(feed_id: &str, query_key: &str) -> String {
        format!("{feed_id}:{query_key}")
    }

    fn load_index(&self) -> Result<HashMap<String, CacheEntry>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| CacheError::Corrupt(e.to_string()))
    }

    /// Reads a cached response, verifying its HMAC. Returns `Ok(None)` on a
    /// plain cache miss; a verification failure is reported distinctly so
    /// callers can log it, but both cases mean "re-issue the query live".
    pub fn get(&self, feed_id: &str, query_key: &str) -> Result<Option<CacheEntry>> {
        let index = self.load_index()?;
        let Some(entry) = index.get(&Self::entry_key(feed_id, query_key)) else {
            return Ok(None);
        };
        let expected = self.sign(&entry.feed_id, &entry.query_key, &entry.payload, entry.fetched_at);
        if expected != entry.hmac {
            tracing::warn!(feed = feed_id, query = query_key, "cache entry failed HMAC verification, discarding");
            return Err(CacheError::Integrity(Self::entry_key(feed_id, query_key)));
        }
        Ok(Some(entry.clone()))
    }

    /// Writes a response to the cache, serializing concurrent writers via
    /// an exclusive lock on `.lock` in the cache directory.
    pub fn put(&self, feed_id: &str, query_key: &str, payload: &str) -> Result<()> {
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;
        let result = self.put_locked(feed_id, query_key, payload);
        FileExt::unlock(&lock_file).ok();
        result
    }

    fn put_locked(&self, feed_id: &str, query_key: &str, payload: &str) -> Result<()> {
        let mut index = self.load_index().unwrap_or_default();
        let fetched_at = Utc::now();
        let hmac = self.sign(feed_id, query_key, payload, fetched_at);
        index.insert(
            Self::entry_key(feed_id, query_key),
            CacheEntry {
                feed_id: feed_id.to_string(),
                query_key: query_key.to_string(),
                payload: payload.to_string(),
                fetched_at,
                hmac,
            },
        );
        let serialized = serde_json::to_string(&index).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        let mut file = File::create(self.index_path())?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    /// Clears every cached entry (the `cache clear` CLI command).
    pub fn clear(&self) -> Result<()> {
        let path = self.index_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_cached_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::open(tmp.path()).unwrap();
        store.put("osv", "npm:lodash:4.17.0", "{\"vulns\":[]}").unwrap();
        let entry = store.get("osv", "npm:lodash:4.17.0").unwrap().unwrap();
        assert_eq!(entry.payload, "{\"vulns\":[]}");
    }

    #[test]
    fn missing_key_is_a_plain_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::open(tmp.path()).unwrap();
        assert!(store.get("osv", "nope").unwrap().is_none());
    }

    #[test]
    fn tampered_payload_fails_integrity_check() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::open(tmp.path()).unwrap();
        store.put("osv", "k", "original").unwrap();

        let index_path = tmp.path().join("index.json");
        let content = fs::read_to_string(&index_path).unwrap();
        let tampered = content.replace("original", "tampered!");
        fs::write(&index_path, tampered).unwrap();

        match store.get("osv", "k") {
            Err(CacheError::Integrity(_)) => {}
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn clear_removes_all_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::open(tmp.path()).unwrap();
        store.put("osv", "k", "v").unwrap();
        store.clear().unwrap();
        assert!(store.get("osv", "k").unwrap().is_none());
    }
}
