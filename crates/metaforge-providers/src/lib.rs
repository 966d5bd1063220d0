//! LLM provider layer for Metaforge.
//!
//! Talks to Claude, OpenAI, and Gemini directly over HTTP and routes each
//! request through a fallback chain.
//!
//! # Architecture
//!
//! - [`registry`]: static specs for the supported vendors + chain building
//! - [`models`]: capability table and preference-driven model selection
//! - [`wire`]: per-vendor request bodies and response parsing
//! - [`traits::LlmProvider`]: trait that all providers implement
//! - [`http_provider::HttpProvider`]: reqwest client for any registry vendor
//! - [`rate_limit::RateLimiter`]: minimum spacing between calls per provider
//! - [`connector::AiConnector`]: cache, rate limit, and fallback in one entry point

pub mod connector;
pub mod error;
pub mod http_provider;
pub mod models;
pub mod rate_limit;
pub mod registry;
pub mod traits;
pub mod wire;

// Re-export main types for convenience
pub use connector::{AiConnector, GenerateOptions};
pub use error::{ConnectorError, ProviderError};
pub use http_provider::{create_provider, HttpProvider};
pub use models::{select_model, ModelSpec, MODELS};
pub use rate_limit::RateLimiter;
pub use registry::{ProviderConfig, ProviderSpec, PROVIDERS};
pub use traits::LlmProvider;
