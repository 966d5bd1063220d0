//! Configuration schema.
//!
//! Hierarchy: `Config` → `AiConfig`, `ProvidersConfig`, `SeoConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Preferences;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.metaforge/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub ai: AiConfig,
    pub providers: ProvidersConfig,
    pub seo: SeoConfig,
}

// ─────────────────────────────────────────────
// AI routing
// ─────────────────────────────────────────────

/// Routing settings: provider order, request defaults, rate limit, cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    /// First provider tried for every request.
    pub primary_provider: String,
    /// Providers tried, in order, after the primary fails.
    pub fallback_providers: Vec<String>,
    /// When false only the primary provider is attempted.
    pub enable_fallback: bool,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Default model selection flags.
    pub preferences: Preferences,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            primary_provider: "claude".to_string(),
            fallback_providers: vec!["openai".to_string(), "gemini".to_string()],
            enable_fallback: true,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
            preferences: Preferences::quality(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Minimum spacing between two calls to the same provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    pub min_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { min_delay_ms: 1000 }
    }
}

/// Persisted response cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Entry lifetime in seconds. 0 disables storing.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 86_400,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, model pin, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Pinned model id; bypasses the model selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations, one per supported vendor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"claude"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "claude" => Some(&self.claude),
            "openai" => Some(&self.openai),
            "gemini" => Some(&self.gemini),
            _ => None,
        }
    }

    /// Mutable variant of [`get_by_name`](Self::get_by_name).
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "claude" => Some(&mut self.claude),
            "openai" => Some(&mut self.openai),
            "gemini" => Some(&mut self.gemini),
            _ => None,
        }
    }

    /// Convert to a HashMap<String, ProviderConfig> for use with the provider registry.
    pub fn to_map(&self) -> HashMap<String, ProviderConfig> {
        [
            ("claude", &self.claude),
            ("openai", &self.openai),
            ("gemini", &self.gemini),
        ]
        .into_iter()
        .map(|(name, config)| (name.to_string(), config.clone()))
        .collect()
    }
}

// ─────────────────────────────────────────────
// SEO output
// ─────────────────────────────────────────────

/// Output limits and generation behavior for SEO fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoConfig {
    pub title_max_length: usize,
    pub description_max_length: usize,
    pub max_keywords: usize,
    pub max_suggestions: usize,
    pub summary_max_length: usize,
    /// How much of the stripped post body is sent to the model.
    pub content_sample_chars: usize,
    /// Regenerate fields that already have a stored value.
    pub overwrite_existing: bool,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            title_max_length: 60,
            description_max_length: 160,
            max_keywords: 10,
            max_suggestions: 5,
            summary_max_length: 300,
            content_sample_chars: 4000,
            overwrite_existing: false,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
