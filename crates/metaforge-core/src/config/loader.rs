//! Config loader: reads `~/.metaforge/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.metaforge/config.json`
//! 3. Environment variables `METAFORGE_<SECTION>__<FIELD>` (override JSON)
//! 4. Vendor variables (`ANTHROPIC_API_KEY`, …) only fill keys still empty

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Renames `ai.fallbackOrder` → `ai.fallbackProviders`.
fn migrate_config(raw: &mut serde_json::Value) {
    if let Some(ai) = raw.get_mut("ai").and_then(|v| v.as_object_mut()) {
        if !ai.contains_key("fallbackProviders") {
            if let Some(order) = ai.remove("fallbackOrder") {
                ai.insert("fallbackProviders".to_string(), order);
                debug!("Migrated ai.fallbackOrder → ai.fallbackProviders");
            }
        }
    }
}

/// Vendor API-key variables, keyed by provider name. They only fill keys
/// that are still empty after the file and `METAFORGE_*` overrides.
pub const VENDOR_KEY_VARS: &[(&str, &str)] = &[
    ("claude", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("gemini", "GEMINI_API_KEY"),
];

/// Apply environment variable overrides on top of a loaded config.
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `var`.
///
/// Env var format: `METAFORGE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `METAFORGE_AI__PRIMARY_PROVIDER` → `ai.primary_provider`
/// - `METAFORGE_AI__FALLBACK_PROVIDERS` → `ai.fallback_providers` (comma list)
/// - `METAFORGE_AI__ENABLE_FALLBACK` → `ai.enable_fallback`
/// - `METAFORGE_AI__TEMPERATURE` → `ai.temperature`
/// - `METAFORGE_AI__MAX_TOKENS` → `ai.max_tokens`
/// - `METAFORGE_AI__MIN_DELAY_MS` → `ai.rate_limit.min_delay_ms`
/// - `METAFORGE_AI__CACHE_ENABLED` → `ai.cache.enabled`
/// - `METAFORGE_PROVIDERS__<NAME>__API_KEY|API_BASE|MODEL` → `providers.<name>.*`
fn apply_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = var("METAFORGE_AI__PRIMARY_PROVIDER") {
        config.ai.primary_provider = val.trim().to_lowercase();
    }
    if let Some(val) = var("METAFORGE_AI__FALLBACK_PROVIDERS") {
        config.ai.fallback_providers = val
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(val) = var("METAFORGE_AI__ENABLE_FALLBACK") {
        config.ai.enable_fallback = parse_bool(&val);
    }
    if let Some(t) = var("METAFORGE_AI__TEMPERATURE").and_then(|v| v.parse::<f64>().ok()) {
        config.ai.temperature = t;
    }
    if let Some(n) = var("METAFORGE_AI__MAX_TOKENS").and_then(|v| v.parse::<u32>().ok()) {
        config.ai.max_tokens = n;
    }
    if let Some(n) = var("METAFORGE_AI__MIN_DELAY_MS").and_then(|v| v.parse::<u64>().ok()) {
        config.ai.rate_limit.min_delay_ms = n;
    }
    if let Some(val) = var("METAFORGE_AI__CACHE_ENABLED") {
        config.ai.cache.enabled = parse_bool(&val);
    }

    for (name, vendor_key) in VENDOR_KEY_VARS {
        if let Some(provider) = config.providers.get_by_name_mut(name) {
            apply_provider_env(provider, name, vendor_key, &var);
        }
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(
    provider: &mut ProviderConfig,
    name: &str,
    vendor_key: &str,
    var: &impl Fn(&str) -> Option<String>,
) {
    let section = name.to_uppercase();
    if let Some(val) = var(format!("METAFORGE_PROVIDERS__{section}__API_KEY").as_str()) {
        provider.api_key = val;
    }
    if let Some(val) = var(format!("METAFORGE_PROVIDERS__{section}__API_BASE").as_str()) {
        provider.api_base = Some(val);
    }
    if let Some(val) = var(format!("METAFORGE_PROVIDERS__{section}__MODEL").as_str()) {
        provider.model = Some(val);
    }
    if provider.api_key.is_empty() {
        if let Some(val) = var(vendor_key) {
            provider.api_key = val;
        }
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.ai.max_tokens, 1024);
        assert_eq!(config.seo.title_max_length, 60);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "ai": {
                "primaryProvider": "openai",
                "maxTokens": 512
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.primary_provider, "openai");
        assert_eq!(config.ai.max_tokens, 512);
        // Default preserved
        assert_eq!(config.ai.temperature, 0.7);
        assert_eq!(config.ai.fallback_providers, vec!["openai", "gemini"]);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.max_tokens, 1024);
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let file = write_temp_json(r#"{ "ai": { "maxTokens": "lots" } }"#);
        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.max_tokens, 1024);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.primary_provider, "claude");
        assert_eq!(config.ai.cache.ttl_secs, 86_400);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.ai.primary_provider = "gemini".to_string();
        config.providers.gemini.api_key = "gm-test".to_string();
        config.providers.gemini.model = Some("gemini-2.0-flash".to_string());

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.ai.primary_provider, "gemini");
        assert_eq!(reloaded.providers.gemini.api_key, "gm-test");
        assert_eq!(
            reloaded.providers.gemini.model.as_deref(),
            Some("gemini-2.0-flash")
        );
    }

    #[test]
    fn test_migrate_fallback_order() {
        let file = write_temp_json(
            r#"{
            "ai": { "fallbackOrder": ["gemini"] }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.fallback_providers, vec!["gemini"]);
    }

    #[test]
    fn test_migrate_no_overwrite() {
        let file = write_temp_json(
            r#"{
            "ai": {
                "fallbackProviders": ["openai"],
                "fallbackOrder": ["gemini"]
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.fallback_providers, vec!["openai"]);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn with_keys(claude: &str, openai: &str) -> Config {
        let mut config = Config::default();
        config.providers.claude.api_key = claude.to_string();
        config.providers.openai.api_key = openai.to_string();
        config
    }

    #[test]
    fn test_env_override_primary_provider() {
        let config = apply_overrides(
            Config::default(),
            env(&[("METAFORGE_AI__PRIMARY_PROVIDER", "OpenAI")]),
        );
        assert_eq!(config.ai.primary_provider, "openai");
    }

    #[test]
    fn test_env_override_fallback_list() {
        let config = apply_overrides(
            Config::default(),
            env(&[("METAFORGE_AI__FALLBACK_PROVIDERS", "gemini, ,claude")]),
        );
        assert_eq!(config.ai.fallback_providers, vec!["gemini", "claude"]);
    }

    #[test]
    fn test_env_override_ai_flags() {
        let config = apply_overrides(
            Config::default(),
            env(&[
                ("METAFORGE_AI__ENABLE_FALLBACK", "false"),
                ("METAFORGE_AI__MIN_DELAY_MS", "250"),
                ("METAFORGE_AI__CACHE_ENABLED", "0"),
                ("METAFORGE_AI__MAX_TOKENS", "not-a-number"),
            ]),
        );
        assert!(!config.ai.enable_fallback);
        assert_eq!(config.ai.rate_limit.min_delay_ms, 250);
        assert!(!config.ai.cache.enabled);
        // Unparsable numbers keep the loaded value
        assert_eq!(config.ai.max_tokens, 1024);
    }

    #[test]
    fn test_env_override_provider_model() {
        let config = apply_overrides(
            Config::default(),
            env(&[("METAFORGE_PROVIDERS__OPENAI__MODEL", "gpt-4o-mini")]),
        );
        assert_eq!(config.providers.openai.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_vendor_key_does_not_overwrite_file_key() {
        let config = apply_overrides(
            with_keys("sk-ant-file", ""),
            env(&[("ANTHROPIC_API_KEY", "sk-ant-env")]),
        );
        assert_eq!(config.providers.claude.api_key, "sk-ant-file");
    }

    #[test]
    fn test_vendor_key_fills_empty_key() {
        let config = apply_overrides(
            with_keys("sk-ant-file", ""),
            env(&[("OPENAI_API_KEY", "sk-openai-env"), ("GEMINI_API_KEY", "gm-env")]),
        );
        assert_eq!(config.providers.openai.api_key, "sk-openai-env");
        assert_eq!(config.providers.gemini.api_key, "gm-env");
    }

    #[test]
    fn test_metaforge_provider_vars_beat_file() {
        let mut file = with_keys("sk-ant-file", "");
        file.providers.claude.api_base = Some("https://file.example".to_string());

        let config = apply_overrides(
            file,
            env(&[
                ("METAFORGE_PROVIDERS__CLAUDE__API_KEY", "sk-ant-override"),
                ("METAFORGE_PROVIDERS__CLAUDE__API_BASE", "https://proxy.example"),
                ("ANTHROPIC_API_KEY", "sk-ant-vendor"),
            ]),
        );
        assert_eq!(config.providers.claude.api_key, "sk-ant-override");
        assert_eq!(
            config.providers.claude.api_base.as_deref(),
            Some("https://proxy.example")
        );
    }

    #[test]
    fn test_no_env_leaves_config_untouched() {
        let config = apply_overrides(with_keys("k1", ""), env(&[]));
        assert_eq!(config.providers.claude.api_key, "k1");
        assert!(config.providers.openai.api_key.is_empty());
        assert_eq!(config.ai.primary_provider, "claude");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" 1 "));
        assert!(parse_bool("YES"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["ai"].get("maxTokens").is_some());
        assert!(raw["ai"].get("max_tokens").is_none());
    }
}
