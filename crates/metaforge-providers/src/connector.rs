//! Fallback dispatcher: one entry point that walks the provider chain.
//!
//! For each provider in order: resolve a model, consult the response cache,
//! wait for the rate limiter, call the vendor. The first success wins; every
//! failure is recorded and the next provider is tried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use metaforge_core::cache::{cache_key, ResponseCache};
use metaforge_core::config::{AiConfig, Config};
use metaforge_core::types::{CompletionRequest, LlmResponse, Preferences, TaskType};

use crate::error::{ConnectorError, ProviderError};
use crate::http_provider::HttpProvider;
use crate::models::{estimate_cost, select_model};
use crate::rate_limit::RateLimiter;
use crate::registry::{build_chain_with, find_by_model, find_by_name, PROVIDERS};
use crate::traits::LlmProvider;

const TEST_SYSTEM_PROMPT: &str = "You are a connection check.";
const TEST_PROMPT: &str = "Reply with the single word: OK";

/// Per-call overrides for [`AiConnector::generate`].
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Use only this provider instead of the configured chain.
    pub provider: Option<String>,
    /// Force a model id. Applied to providers that own it (or to all when the
    /// id matches no known vendor).
    pub model: Option<String>,
    /// Model selection flags; defaults to `ai.preferences`.
    pub preferences: Option<Preferences>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    /// Neither read from nor write to the response cache.
    pub skip_cache: bool,
}

struct ProviderSlot {
    client: Arc<dyn LlmProvider>,
    /// `providers.<name>.model` from config.
    pinned_model: Option<String>,
}

/// Routes generation requests across the configured providers.
pub struct AiConnector {
    ai: AiConfig,
    slots: Vec<ProviderSlot>,
    rate_limiter: RateLimiter,
    cache: Option<ResponseCache>,
}

impl AiConnector {
    /// Connector with no providers and no cache. Add them with the `with_*` builders.
    pub fn new(ai: AiConfig) -> Self {
        let rate_limiter = RateLimiter::new(Duration::from_millis(ai.rate_limit.min_delay_ms));
        AiConnector {
            ai,
            slots: Vec::new(),
            rate_limiter,
            cache: None,
        }
    }

    /// One `HttpProvider` per configured vendor, plus the default on-disk cache
    /// when `ai.cache.enabled`.
    pub fn from_config(config: &Config) -> Self {
        let mut connector = AiConnector::new(config.ai.clone());

        for spec in PROVIDERS {
            let Some(pc) = config.providers.get_by_name(spec.name) else {
                continue;
            };
            if !pc.is_configured() {
                continue;
            }
            match HttpProvider::new(pc, spec, config.ai.timeout_secs) {
                Ok(provider) => {
                    connector = connector.with_provider(Arc::new(provider), pc.model.clone());
                }
                Err(e) => warn!(provider = spec.name, error = %e, "Failed to create provider"),
            }
        }

        if config.ai.cache.enabled {
            match ResponseCache::new(None, config.ai.cache.ttl_secs) {
                Ok(cache) => connector = connector.with_cache(cache),
                Err(e) => warn!(error = %e, "Response cache unavailable, continuing without it"),
            }
        }

        connector
    }

    /// Register a provider. A later registration with the same name replaces the earlier one.
    pub fn with_provider(mut self, client: Arc<dyn LlmProvider>, pinned_model: Option<String>) -> Self {
        self.slots.retain(|s| s.client.name() != client.name());
        self.slots.push(ProviderSlot {
            client,
            pinned_model,
        });
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ai_config(&self) -> &AiConfig {
        &self.ai
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn slot(&self, name: &str) -> Option<&ProviderSlot> {
        self.slots.iter().find(|s| s.client.name() == name)
    }

    /// Provider names in the order `generate` will try them.
    pub fn chain_names(&self) -> Vec<String> {
        build_chain_with(&self.ai, |name| self.slot(name).is_some())
            .into_iter()
            .map(|spec| spec.name.to_string())
            .collect()
    }

    /// Model a provider would be called with for `task`.
    pub fn resolve_model(&self, provider: &str, task: TaskType, opts: &GenerateOptions) -> String {
        if let Some(model) = &opts.model {
            if find_by_model(model).map_or(true, |spec| spec.name == provider) {
                return model.clone();
            }
        }
        if let Some(pinned) = self.slot(provider).and_then(|s| s.pinned_model.clone()) {
            return pinned;
        }
        let prefs = opts.preferences.unwrap_or(self.ai.preferences);
        match find_by_name(provider) {
            Some(spec) => select_model(spec, task, &prefs).to_string(),
            None => self
                .slot(provider)
                .map(|s| s.client.default_model().to_string())
                .unwrap_or_default(),
        }
    }

    /// Generate text for `task`, falling back through the chain.
    pub async fn generate(
        &self,
        task: TaskType,
        system_prompt: &str,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> Result<LlmResponse, ConnectorError> {
        let chain: Vec<String> = match &opts.provider {
            Some(forced) => {
                if self.slot(forced).is_none() {
                    return Err(ProviderError::NotConfigured(forced.clone()).into());
                }
                vec![forced.clone()]
            }
            None => self.chain_names(),
        };
        if chain.is_empty() {
            return Err(ConnectorError::NoProviders);
        }

        let request = CompletionRequest::new(task, system_prompt, prompt)
            .with_max_tokens(opts.max_tokens.unwrap_or(self.ai.max_tokens))
            .with_temperature(opts.temperature.unwrap_or(self.ai.temperature));
        let cache = self.cache.as_ref().filter(|_| !opts.skip_cache);

        let mut failures: Vec<(String, ProviderError)> = Vec::new();
        for name in &chain {
            let Some(slot) = self.slot(name) else {
                continue;
            };
            let model = self.resolve_model(name, task, opts);
            let key = cache_key(name, &model, &request);

            if let Some(entry) = cache.and_then(|c| c.get(&key)) {
                debug!(provider = %name, model = %model, task = %task, "Cache hit");
                return Ok(LlmResponse {
                    content: entry.content,
                    model: entry.model,
                    provider: entry.provider,
                    finish_reason: None,
                    usage: None,
                    cached: true,
                });
            }

            self.rate_limiter.acquire(name).await;

            match slot.client.complete(&model, &request).await {
                Ok(response) => {
                    if let Some(usage) = &response.usage {
                        info!(
                            provider = %name,
                            model = %model,
                            task = %task,
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            cost_usd = estimate_cost(&model, usage),
                            "Generated"
                        );
                    }
                    if let Some(c) = cache {
                        c.put(&key, name, &model, &response.content);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    warn!(provider = %name, model = %model, error = %e, "Provider failed, trying next");
                    failures.push((name.clone(), e));
                }
            }
        }

        Err(ConnectorError::AllProvidersFailed(failures))
    }

    /// Send a tiny fixed prompt to one provider, bypassing the cache.
    pub async fn test_provider(&self, name: &str) -> Result<LlmResponse, ConnectorError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| ProviderError::NotConfigured(name.to_string()))?;

        let model = self.resolve_model(name, TaskType::MetaTitle, &GenerateOptions::default());
        let request = CompletionRequest::new(TaskType::MetaTitle, TEST_SYSTEM_PROMPT, TEST_PROMPT)
            .with_max_tokens(16)
            .with_temperature(0.0);

        self.rate_limiter.acquire(name).await;
        Ok(slot.client.complete(&model, &request).await?)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use metaforge_core::config::{CacheConfig, ProviderConfig, RateLimitConfig};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Provider that replays scripted results and records the models it was asked for.
    struct ScriptedProvider {
        name: &'static str,
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        models: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(ScriptedProvider {
                name,
                script: Mutex::new(script.into()),
                models: Mutex::new(Vec::new()),
            })
        }

        fn ok(name: &'static str, text: &str) -> Arc<Self> {
            Self::new(name, vec![Ok(text.to_string())])
        }

        fn calls(&self) -> usize {
            self.models.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            model: &str,
            _req: &CompletionRequest,
        ) -> Result<LlmResponse, ProviderError> {
            self.models.lock().unwrap().push(model.to_string());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse));
            next.map(|content| LlmResponse {
                content,
                model: model.to_string(),
                provider: self.name.to_string(),
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            self.name
        }

        fn display_name(&self) -> &str {
            self.name
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    fn ai(primary: &str, fallbacks: &[&str]) -> AiConfig {
        AiConfig {
            primary_provider: primary.to_string(),
            fallback_providers: fallbacks.iter().map(|s| s.to_string()).collect(),
            rate_limit: RateLimitConfig { min_delay_ms: 0 },
            ..Default::default()
        }
    }

    fn api_error(status: u16) -> ProviderError {
        ProviderError::Api {
            status,
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallbacks() {
        let claude = ScriptedProvider::ok("claude", "From Claude");
        let openai = ScriptedProvider::ok("openai", "From OpenAI");
        let connector = AiConnector::new(ai("claude", &["openai"]))
            .with_provider(claude.clone(), None)
            .with_provider(openai.clone(), None);

        let resp = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(resp.content, "From Claude");
        assert_eq!(claude.calls(), 1);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let claude = ScriptedProvider::new("claude", vec![Err(api_error(500))]);
        let openai = ScriptedProvider::new("openai", vec![Err(ProviderError::Timeout(60))]);
        let gemini = ScriptedProvider::ok("gemini", "From Gemini");
        let connector = AiConnector::new(ai("claude", &["openai", "gemini"]))
            .with_provider(claude.clone(), None)
            .with_provider(openai.clone(), None)
            .with_provider(gemini.clone(), None);

        let resp = connector
            .generate(TaskType::MetaDescription, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(resp.provider, "gemini");
        assert_eq!((claude.calls(), openai.calls(), gemini.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_all_failed_collects_errors_in_order() {
        let connector = AiConnector::new(ai("openai", &["claude"]))
            .with_provider(ScriptedProvider::new("claude", vec![Err(api_error(503))]), None)
            .with_provider(
                ScriptedProvider::new("openai", vec![Err(ProviderError::RateLimited("slow down".into()))]),
                None,
            );

        let err = connector
            .generate(TaskType::ContentSummary, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap_err();

        let names: Vec<&str> = err.failures().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["openai", "claude"]);
        assert_eq!(
            err.to_string(),
            "all AI providers failed [openai: rate limited: slow down; claude: api error (503): boom]"
        );
    }

    #[tokio::test]
    async fn test_no_providers() {
        let connector = AiConnector::new(ai("claude", &["openai"]));
        let err = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::NoProviders));
    }

    #[tokio::test]
    async fn test_unconfigured_primary_is_skipped() {
        let openai = ScriptedProvider::ok("openai", "ok");
        let connector = AiConnector::new(ai("claude", &["openai"])).with_provider(openai, None);
        assert_eq!(connector.chain_names(), vec!["openai"]);
    }

    #[tokio::test]
    async fn test_fallback_disabled_uses_primary_only() {
        let mut config = ai("claude", &["openai"]);
        config.enable_fallback = false;
        let connector = AiConnector::new(config)
            .with_provider(ScriptedProvider::new("claude", vec![Err(api_error(500))]), None)
            .with_provider(ScriptedProvider::ok("openai", "unused"), None);

        let err = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.failures().len(), 1);
    }

    #[tokio::test]
    async fn test_forced_provider() {
        let claude = ScriptedProvider::ok("claude", "nope");
        let gemini = ScriptedProvider::ok("gemini", "forced");
        let connector = AiConnector::new(ai("claude", &[]))
            .with_provider(claude.clone(), None)
            .with_provider(gemini, None);

        let opts = GenerateOptions {
            provider: Some("gemini".to_string()),
            ..Default::default()
        };
        let resp = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &opts)
            .await
            .unwrap();
        assert_eq!(resp.content, "forced");
        assert_eq!(claude.calls(), 0);

        let opts = GenerateOptions {
            provider: Some("openai".to_string()),
            ..Default::default()
        };
        let err = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Provider(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_model_resolution_order() {
        let claude = ScriptedProvider::new("claude", vec![Ok("a".into()), Ok("b".into()), Ok("c".into())]);
        let connector = AiConnector::new(ai("claude", &[])).with_provider(claude.clone(), None);

        // Selector with preferences
        let opts = GenerateOptions {
            preferences: Some(Preferences::speed()),
            ..Default::default()
        };
        connector.generate(TaskType::MetaTitle, "s", "p", &opts).await.unwrap();

        // Explicit model for this vendor
        let opts = GenerateOptions {
            model: Some("claude-opus-4-20250514".to_string()),
            ..Default::default()
        };
        connector.generate(TaskType::MetaTitle, "s", "p", &opts).await.unwrap();

        // Explicit model for another vendor is ignored
        let opts = GenerateOptions {
            model: Some("gpt-4o".to_string()),
            preferences: Some(Preferences::quality()),
            ..Default::default()
        };
        connector.generate(TaskType::MetaTitle, "s", "p", &opts).await.unwrap();

        assert_eq!(
            *claude.models.lock().unwrap(),
            vec![
                "claude-3-5-haiku-20241022",
                "claude-opus-4-20250514",
                "claude-sonnet-4-20250514"
            ]
        );
    }

    #[tokio::test]
    async fn test_pinned_model_beats_selector() {
        let openai = ScriptedProvider::ok("openai", "x");
        let connector = AiConnector::new(ai("openai", &[]))
            .with_provider(openai.clone(), Some("gpt-4o".to_string()));
        connector
            .generate(TaskType::MetaTitle, "s", "p", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(*openai.models.lock().unwrap(), vec!["gpt-4o"]);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let dir = tempdir().unwrap();
        let claude = ScriptedProvider::ok("claude", "Cached Title");
        let connector = AiConnector::new(ai("claude", &[]))
            .with_provider(claude.clone(), None)
            .with_cache(ResponseCache::new(Some(dir.path().to_path_buf()), 3600).unwrap());

        let first = connector
            .generate(TaskType::MetaTitle, "s", "p", &GenerateOptions::default())
            .await
            .unwrap();
        let second = connector
            .generate(TaskType::MetaTitle, "s", "p", &GenerateOptions::default())
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.content, "Cached Title");
        assert_eq!(second.provider, "claude");
        assert_eq!(claude.calls(), 1);
    }

    #[tokio::test]
    async fn test_skip_cache_always_calls() {
        let dir = tempdir().unwrap();
        let claude = ScriptedProvider::new("claude", vec![Ok("one".into()), Ok("two".into())]);
        let connector = AiConnector::new(ai("claude", &[]))
            .with_provider(claude.clone(), None)
            .with_cache(ResponseCache::new(Some(dir.path().to_path_buf()), 3600).unwrap());

        let opts = GenerateOptions {
            skip_cache: true,
            ..Default::default()
        };
        connector.generate(TaskType::MetaTitle, "s", "p", &opts).await.unwrap();
        let resp = connector.generate(TaskType::MetaTitle, "s", "p", &opts).await.unwrap();

        assert_eq!(resp.content, "two");
        assert_eq!(claude.calls(), 2);
        assert_eq!(connector.cache().unwrap().stats().entries, 0);
    }

    #[tokio::test]
    async fn test_failed_call_is_not_cached() {
        let dir = tempdir().unwrap();
        let claude = ScriptedProvider::new("claude", vec![Err(api_error(500)), Ok("later".into())]);
        let connector = AiConnector::new(ai("claude", &[]))
            .with_provider(claude.clone(), None)
            .with_cache(ResponseCache::new(Some(dir.path().to_path_buf()), 3600).unwrap());

        assert!(connector
            .generate(TaskType::MetaTitle, "s", "p", &GenerateOptions::default())
            .await
            .is_err());
        let resp = connector
            .generate(TaskType::MetaTitle, "s", "p", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(resp.content, "later");
        assert!(!resp.cached);
    }

    #[tokio::test]
    async fn test_test_provider() {
        let gemini = ScriptedProvider::ok("gemini", "OK");
        let connector = AiConnector::new(ai("claude", &[])).with_provider(gemini, None);

        let resp = connector.test_provider("gemini").await.unwrap();
        assert_eq!(resp.content, "OK");
        assert!(connector.test_provider("claude").await.is_err());
    }

    #[tokio::test]
    async fn test_http_fallback_from_500_to_healthy_provider() {
        let failing = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "type": "error",
                "error": {"type": "api_error", "message": "Overloaded"}
            })))
            .expect(1)
            .mount(&failing)
            .await;

        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Healthy Title"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            })))
            .expect(1)
            .mount(&healthy)
            .await;

        let mut config = Config::default();
        config.ai = ai("claude", &["openai"]);
        config.ai.cache = CacheConfig {
            enabled: false,
            ttl_secs: 0,
        };
        config.providers.claude = ProviderConfig {
            api_key: "sk-ant-test".to_string(),
            api_base: Some(failing.uri()),
            ..Default::default()
        };
        config.providers.openai = ProviderConfig {
            api_key: "sk-test".to_string(),
            api_base: Some(healthy.uri()),
            ..Default::default()
        };

        let connector = AiConnector::from_config(&config);
        assert!(connector.cache().is_none());
        assert_eq!(connector.chain_names(), vec!["claude", "openai"]);

        let resp = connector
            .generate(TaskType::MetaTitle, "sys", "prompt", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(resp.content, "Healthy Title");
        assert_eq!(resp.provider, "openai");
    }
}
