//! Post-meta: per-post key/value metadata, the host CMS's persistence boundary.
//!
//! The generator only talks to the [`MetaStore`] trait. [`JsonMetaStore`]
//! keeps one JSON object per post under `~/.metaforge/postmeta/{post_id}.json`;
//! [`MemoryMetaStore`] backs dry runs and tests.

pub mod store;

pub use store::{JsonMetaStore, MemoryMetaStore, MetaStore, MetaStoreError};
