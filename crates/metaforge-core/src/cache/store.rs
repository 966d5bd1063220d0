//! Persisted LLM response cache with TTL expiry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::types::CompletionRequest;
use crate::utils;

/// TTLs are clamped to a century so `now + ttl` cannot overflow.
const MAX_TTL_SECS: u64 = 100 * 365 * 86_400;

// ─────────────────────────────────────────────
// Cache key
// ─────────────────────────────────────────────

/// Hash a request into a cache key (lowercase hex SHA-256).
///
/// Covers provider, model, task, both prompts, max_tokens, and temperature,
/// so changing any of them is a miss.
pub fn cache_key(provider: &str, model: &str, request: &CompletionRequest) -> String {
    let canonical = [
        provider.to_string(),
        model.to_string(),
        request.task.as_str().to_string(),
        request.system_prompt.clone(),
        request.prompt.clone(),
        request.max_tokens.to_string(),
        format!("{:.3}", request.temperature),
    ]
    .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ─────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────

/// One cached response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub provider: String,
    pub model: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Snapshot of what is on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub total_bytes: u64,
}

// ─────────────────────────────────────────────
// ResponseCache
// ─────────────────────────────────────────────

/// Response cache backed by a directory of JSON files.
///
/// Thread-safe via `RwLock`: multiple readers, exclusive writer.
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
    memory: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Create a cache rooted at `dir` (defaults to `~/.metaforge/cache/`).
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(dir: Option<PathBuf>, ttl_secs: u64) -> std::io::Result<Self> {
        let dir = dir.unwrap_or_else(utils::get_cache_path);
        std::fs::create_dir_all(&dir)?;

        Ok(ResponseCache {
            dir,
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            memory: RwLock::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a live entry. Expired or unreadable entries are misses.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let cached = self
            .memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();

        let entry = match cached {
            Some(entry) => entry,
            None => {
                let entry = self.load_from_disk(key)?;
                self.memory
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.to_string(), entry.clone());
                entry
            }
        };

        if entry.is_expired() {
            debug!(key = %key, "Cache entry expired");
            self.remove(key);
            return None;
        }

        Some(entry)
    }

    /// Store a response. No-op when the TTL is zero.
    pub fn put(&self, key: &str, provider: &str, model: &str, content: &str) {
        if self.ttl <= Duration::zero() {
            return;
        }

        let now = Utc::now();
        let entry = CacheEntry {
            key: key.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            content: content.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        if let Err(e) = self.save_to_disk(&entry) {
            warn!("Failed to persist cache entry {}: {}", key, e);
        }
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    /// Remove one entry. Returns `true` if a file was deleted.
    pub fn remove(&self, key: &str) -> bool {
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        let path = self.entry_path(key);
        if !path.exists() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to delete cache file {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Remove every entry. Returns the number of files deleted.
    pub fn clear(&self) -> usize {
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        self.entry_files()
            .into_iter()
            .filter(|path| std::fs::remove_file(path).is_ok())
            .count()
    }

    /// Remove expired entries. Returns the number of files deleted.
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for path in self.entry_files() {
            let expired = match read_entry(&path) {
                Some(entry) => entry.is_expired(),
                // Unreadable files are garbage too
                None => true,
            };
            if expired && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| !entry.is_expired());

        debug!(removed, "Purged expired cache entries");
        removed
    }

    /// Count entries on disk.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for path in self.entry_files() {
            stats.entries += 1;
            stats.total_bytes += std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if read_entry(&path).map_or(true, |e| e.is_expired()) {
                stats.expired += 1;
            }
        }
        stats
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_key(key)))
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
                .collect(),
            Err(e) => {
                warn!("Failed to read cache directory: {}", e);
                Vec::new()
            }
        }
    }

    fn load_from_disk(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        if !path.exists() {
            return None;
        }
        read_entry(&path)
    }

    fn save_to_disk(&self, entry: &CacheEntry) -> std::io::Result<()> {
        let path = self.entry_path(&entry.key);
        let json = serde_json::to_string(entry)?;
        std::fs::write(&path, json)?;
        debug!(key = %entry.key, provider = %entry.provider, "Cached response");
        Ok(())
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Corrupt cache file {}: {}", path.display(), e);
            None
        }
    }
}

/// Keys are hex digests in practice; anything else is reduced to a safe filename.
fn safe_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
