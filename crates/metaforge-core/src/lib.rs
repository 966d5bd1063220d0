//! Metaforge core: shared types, configuration, and persistence.
//!
//! - [`types`]: task types, preferences, posts, provider-agnostic requests/responses
//! - [`config`]: schema + loader (`~/.metaforge/config.json` + env overrides)
//! - [`cache`]: persisted LLM response cache keyed by request hash
//! - [`postmeta`]: per-post key/value metadata store
//! - [`utils`]: paths, truncation, HTML stripping

pub mod cache;
pub mod config;
pub mod postmeta;
pub mod types;
pub mod utils;

pub use cache::ResponseCache;
pub use config::Config;
pub use postmeta::{JsonMetaStore, MemoryMetaStore, MetaStore, MetaStoreError};
pub use types::{CompletionRequest, LlmResponse, PostContent, Preferences, TaskType, UsageInfo};
