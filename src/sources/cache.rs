//! Persisted result cache for source clients.
//!
//! Each provider owns one cache namespace (a directory) holding one JSON
//! file per cache key. Keys are SHA-256 digests of `source | query`, so
//! identical queries against the same provider always map to the same
//! entry and providers can never collide with each other.
//!
//! Entries have no expiry: a hit is returned verbatim and is never
//! re-validated against the live API. Corrupt or unreadable files are
//! treated as misses, never as errors.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{AppError, Paper, Result, SourceId};

/// Hit/miss counters for cache observability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate as a fraction in `[0, 1]`; 0.0 when the cache is unused.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Storage interface for normalized result lists.
///
/// Get/put only; there is no invalidation or expiry.
pub trait ResultCache: Send + Sync {
    /// Retrieve the result list stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<Paper>>;

    /// Store a result list under `key`.
    fn put(&self, key: &str, papers: &[Paper]) -> Result<()>;

    /// Hit/miss counters since construction.
    fn stats(&self) -> CacheStats;

    /// Compute the cache key for a (source, query) pair.
    fn compute_key(&self, source: SourceId, query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(query.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// File-backed cache: one `<key>.json` document per entry.
pub struct FileResultCache {
    dir: PathBuf,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FileResultCache {
    /// Open (creating if needed) the cache namespace at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Cache(format!("Failed to create cache dir {}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ResultCache for FileResultCache {
    fn get(&self, key: &str) -> Option<Vec<Paper>> {
        let path = self.entry_path(key);
        let parsed = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Vec<Paper>>(&raw).ok());

        match parsed {
            Some(papers) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, count = papers.len(), "cache hit");
                Some(papers)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &str, papers: &[Paper]) -> Result<()> {
        let raw = serde_json::to_string(papers)
            .map_err(|e| AppError::Cache(format!("Failed to encode cache entry: {}", e)))?;
        fs::write(self.entry_path(key), raw).map_err(|e| {
            AppError::Cache(format!("Failed to write cache entry {}: {}", key, e))
        })
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// A cache that stores nothing.
///
/// Useful for disabling caching without changing the client structure.
#[derive(Debug, Default)]
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl ResultCache for NoOpCache {
    fn get(&self, _key: &str) -> Option<Vec<Paper>> {
        None
    }

    fn put(&self, _key: &str, _papers: &[Paper]) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
