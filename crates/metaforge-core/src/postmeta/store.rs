//! `MetaStore` trait and its file/memory implementations.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::utils;

/// Post-meta persistence failure.
#[derive(Debug, Error)]
pub enum MetaStoreError {
    #[error("post-meta I/O error for post {post_id}: {source}")]
    Io {
        post_id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt post-meta file for post {post_id}: {source}")]
    Corrupt {
        post_id: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-post key/value store.
pub trait MetaStore: Send + Sync {
    /// Read one value.
    fn get(&self, post_id: u64, key: &str) -> Result<Option<String>, MetaStoreError>;

    /// Write one value (insert or replace).
    fn set(&self, post_id: u64, key: &str, value: &str) -> Result<(), MetaStoreError>;

    /// Delete one value. Returns `true` if it existed.
    fn delete(&self, post_id: u64, key: &str) -> Result<bool, MetaStoreError>;

    /// All values for a post, sorted by key.
    fn all(&self, post_id: u64) -> Result<BTreeMap<String, String>, MetaStoreError>;
}

// ─────────────────────────────────────────────
// JsonMetaStore
// ─────────────────────────────────────────────

/// File-backed store: `{dir}/{post_id}.json` holds a flat string map.
pub struct JsonMetaStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: RwLock<()>,
}

impl JsonMetaStore {
    /// `dir` defaults to `~/.metaforge/postmeta/`. Created lazily on first write.
    pub fn new(dir: Option<PathBuf>) -> Self {
        JsonMetaStore {
            dir: dir.unwrap_or_else(utils::get_postmeta_path),
            lock: RwLock::new(()),
        }
    }

    fn post_path(&self, post_id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", post_id))
    }

    fn read_map(&self, post_id: u64) -> Result<BTreeMap<String, String>, MetaStoreError> {
        let path = self.post_path(post_id);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|source| MetaStoreError::Io { post_id, source })?;
        serde_json::from_str(&content).map_err(|source| MetaStoreError::Corrupt { post_id, source })
    }

    /// Write to a temp file, then rename over the target.
    fn write_map(&self, post_id: u64, map: &BTreeMap<String, String>) -> Result<(), MetaStoreError> {
        let io_err = |source| MetaStoreError::Io { post_id, source };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let json = serde_json::to_string_pretty(map)
            .map_err(|source| MetaStoreError::Corrupt { post_id, source })?;

        let path = self.post_path(post_id);
        let tmp = self.dir.join(format!(".{}.json.tmp", post_id));
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(post_id, keys = map.len(), "Saved post-meta to {}", path.display());
        Ok(())
    }
}

impl MetaStore for JsonMetaStore {
    fn get(&self, post_id: u64, key: &str) -> Result<Option<String>, MetaStoreError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map(post_id)?.remove(key))
    }

    fn set(&self, post_id: u64, key: &str, value: &str) -> Result<(), MetaStoreError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map(post_id)?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(post_id, &map)
    }

    fn delete(&self, post_id: u64, key: &str) -> Result<bool, MetaStoreError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map(post_id)?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.write_map(post_id, &map)?;
        Ok(true)
    }

    fn all(&self, post_id: u64) -> Result<BTreeMap<String, String>, MetaStoreError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_map(post_id)
    }
}

// ─────────────────────────────────────────────
// MemoryMetaStore
// ─────────────────────────────────────────────

/// In-memory store (dry runs, tests).
#[derive(Default)]
pub struct MemoryMetaStore {
    posts: RwLock<HashMap<u64, BTreeMap<String, String>>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaStore for MemoryMetaStore {
    fn get(&self, post_id: u64, key: &str) -> Result<Option<String>, MetaStoreError> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.get(&post_id).and_then(|m| m.get(key)).cloned())
    }

    fn set(&self, post_id: u64, key: &str, value: &str) -> Result<(), MetaStoreError> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        posts
            .entry(post_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, post_id: u64, key: &str) -> Result<bool, MetaStoreError> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        Ok(posts
            .get_mut(&post_id)
            .map_or(false, |m| m.remove(key).is_some()))
    }

    fn all(&self, post_id: u64) -> Result<BTreeMap<String, String>, MetaStoreError> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.get(&post_id).cloned().unwrap_or_default())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
