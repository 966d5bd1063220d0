//! Provider registry: static specs for the supported LLM vendors.
//!
//! Each `ProviderSpec` describes how to reach a vendor: wire format, auth
//! style, default endpoint and model, output token ceiling, and the keywords
//! used to map a bare model id back to its vendor.

use std::collections::HashMap;

use tracing::warn;

use metaforge_core::config::AiConfig;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// JSON dialect a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// Anthropic `/v1/messages`.
    Anthropic,
    /// OpenAI `/chat/completions`.
    OpenAi,
    /// Google `models/{model}:generateContent`.
    Gemini,
}

/// Where the API key goes on the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// `x-api-key: <key>`.
    XApiKey,
    /// `?key=<key>` query parameter.
    QueryKey,
}

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"claude"`). Matches the config section.
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Claude (Anthropic)"`.
    pub display_name: &'static str,
    /// Vendor environment variable for the API key (read by the config loader).
    pub env_key: &'static str,
    pub wire: WireFormat,
    pub auth: AuthStyle,
    /// Default API base URL, overridable per config.
    pub default_api_base: &'static str,
    /// Model used when the capability table has nothing for this provider.
    pub default_model: &'static str,
    /// Hard ceiling on generated tokens for any model of this provider.
    pub max_output_tokens: u32,
    /// Keywords to match in model names (lowercase).
    pub keywords: &'static [&'static str],
}

// ─────────────────────────────────────────────
// All providers (in default priority order)
// ─────────────────────────────────────────────

/// Complete list of supported provider specifications, in priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "claude",
        display_name: "Claude (Anthropic)",
        env_key: "ANTHROPIC_API_KEY",
        wire: WireFormat::Anthropic,
        auth: AuthStyle::XApiKey,
        default_api_base: "https://api.anthropic.com",
        default_model: "claude-sonnet-4-20250514",
        max_output_tokens: 8192,
        keywords: &["claude", "anthropic"],
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        wire: WireFormat::OpenAi,
        auth: AuthStyle::Bearer,
        default_api_base: "https://api.openai.com/v1",
        default_model: "gpt-4o-mini",
        max_output_tokens: 16384,
        keywords: &["gpt", "openai"],
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Gemini (Google)",
        env_key: "GEMINI_API_KEY",
        wire: WireFormat::Gemini,
        auth: AuthStyle::QueryKey,
        default_api_base: "https://generativelanguage.googleapis.com",
        default_model: "gemini-2.0-flash",
        max_output_tokens: 8192,
        keywords: &["gemini", "google"],
    },
];

// ─────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Find a provider spec by matching keywords against a model name.
///
/// Returns the first match in priority order.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS
        .iter()
        .find(|spec| spec.keywords.iter().any(|kw| model_lower.contains(kw)))
}

/// Re-export the provider config from core: single source of truth.
pub use metaforge_core::config::ProviderConfig;

// ─────────────────────────────────────────────
// Fallback chain
// ─────────────────────────────────────────────

/// Build the ordered list of providers to attempt from the config file view.
///
/// 1. Primary first, then `fallback_providers` (only the primary when
///    `enable_fallback` is false).
/// 2. Unknown names are dropped with a warning; duplicates keep their first position.
/// 3. Providers without an API key are skipped.
pub fn build_chain(
    ai: &AiConfig,
    providers: &HashMap<String, ProviderConfig>,
) -> Vec<&'static ProviderSpec> {
    build_chain_with(ai, |name| {
        providers.get(name).map_or(false, |c| c.is_configured())
    })
}

/// Same ordering rules as [`build_chain`], with availability decided by the caller.
pub fn build_chain_with(
    ai: &AiConfig,
    is_available: impl Fn(&str) -> bool,
) -> Vec<&'static ProviderSpec> {
    let mut names: Vec<&str> = vec![ai.primary_provider.as_str()];
    if ai.enable_fallback {
        names.extend(ai.fallback_providers.iter().map(String::as_str));
    }

    let mut chain: Vec<&'static ProviderSpec> = Vec::new();
    for name in names {
        let Some(spec) = find_by_name(name) else {
            warn!(provider = name, "Unknown provider in fallback chain, skipping");
            continue;
        };
        if chain.iter().any(|s| s.name == spec.name) {
            continue;
        }
        if !is_available(spec.name) {
            continue;
        }
        chain.push(spec);
    }
    chain
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(names: &[&str]) -> HashMap<String, ProviderConfig> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    ProviderConfig {
                        api_key: format!("key-{}", n),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn ai(primary: &str, fallbacks: &[&str], enable: bool) -> AiConfig {
        AiConfig {
            primary_provider: primary.to_string(),
            fallback_providers: fallbacks.iter().map(|s| s.to_string()).collect(),
            enable_fallback: enable,
            ..Default::default()
        }
    }

    fn names(chain: &[&'static ProviderSpec]) -> Vec<&'static str> {
        chain.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("claude").unwrap();
        assert_eq!(spec.wire, WireFormat::Anthropic);
        assert_eq!(spec.auth, AuthStyle::XApiKey);
        assert!(find_by_name("mistral").is_none());
    }

    #[test]
    fn test_find_by_model() {
        assert_eq!(find_by_model("claude-3-5-haiku-20241022").unwrap().name, "claude");
        assert_eq!(find_by_model("gpt-4o-mini").unwrap().name, "openai");
        assert_eq!(find_by_model("Gemini-1.5-Pro").unwrap().name, "gemini");
        assert!(find_by_model("llama-3.3-70b").is_none());
    }

    #[test]
    fn test_chain_primary_then_fallbacks() {
        let chain = build_chain(
            &ai("claude", &["openai", "gemini"], true),
            &keyed(&["claude", "openai", "gemini"]),
        );
        assert_eq!(names(&chain), vec!["claude", "openai", "gemini"]);
    }

    #[test]
    fn test_chain_respects_custom_order() {
        let chain = build_chain(
            &ai("gemini", &["claude", "openai"], true),
            &keyed(&["claude", "openai", "gemini"]),
        );
        assert_eq!(names(&chain), vec!["gemini", "claude", "openai"]);
    }

    #[test]
    fn test_chain_skips_unconfigured() {
        let chain = build_chain(
            &ai("claude", &["openai", "gemini"], true),
            &keyed(&["gemini"]),
        );
        assert_eq!(names(&chain), vec!["gemini"]);
    }

    #[test]
    fn test_chain_fallback_disabled() {
        let chain = build_chain(
            &ai("openai", &["claude"], false),
            &keyed(&["claude", "openai"]),
        );
        assert_eq!(names(&chain), vec!["openai"]);
    }

    #[test]
    fn test_chain_dedupes_and_drops_unknown() {
        let chain = build_chain(
            &ai("claude", &["mistral", "claude", "openai", "openai"], true),
            &keyed(&["claude", "openai"]),
        );
        assert_eq!(names(&chain), vec!["claude", "openai"]);
    }

    #[test]
    fn test_chain_empty_when_nothing_configured() {
        let chain = build_chain(&AiConfig::default(), &HashMap::new());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_chain_with_predicate() {
        let chain = build_chain_with(&ai("openai", &["gemini", "claude"], true), |n| n != "gemini");
        assert_eq!(names(&chain), vec!["openai", "claude"]);
    }

    #[test]
    fn test_env_keys_match_config_loader() {
        use metaforge_core::config::VENDOR_KEY_VARS;

        assert_eq!(VENDOR_KEY_VARS.len(), PROVIDERS.len());
        for spec in PROVIDERS {
            let loader_key = VENDOR_KEY_VARS
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, key)| *key);
            assert_eq!(loader_key, Some(spec.env_key), "{}", spec.name);
        }
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let mut names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PROVIDERS.len());
    }
}
