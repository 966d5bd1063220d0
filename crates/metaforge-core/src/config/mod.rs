//! Configuration system: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use metaforge_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Primary provider: {}", cfg.ai.primary_provider);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config, VENDOR_KEY_VARS};
pub use schema::{
    AiConfig, CacheConfig, Config, ProviderConfig, ProvidersConfig, RateLimitConfig, SeoConfig,
};
