//! Response cache: in-memory map + one JSON file per entry.
//!
//! # Disk format
//!
//! Each entry lives at `~/.metaforge/cache/{key}.json`, where `key` is the
//! hex SHA-256 of the request (see [`cache_key`]):
//! `{"key": "...", "provider": "claude", "model": "...", "content": "...", "created_at": "...", "expires_at": "..."}`

pub mod store;

pub use store::{cache_key, CacheEntry, CacheStats, ResponseCache};
