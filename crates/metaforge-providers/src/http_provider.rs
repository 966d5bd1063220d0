//! Generic HTTP-based LLM provider.
//!
//! One `HttpProvider` per vendor: the `ProviderSpec` decides the wire format
//! and where the API key goes, `wire` does the JSON, this module does the I/O
//! and maps failures onto `ProviderError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use metaforge_core::config::ProvidersConfig;
use metaforge_core::types::{CompletionRequest, LlmResponse};
use metaforge_core::utils::mask_api_key;

use crate::error::ProviderError;
use crate::models::clamp_max_tokens;
use crate::registry::{find_by_name, AuthStyle, ProviderConfig, ProviderSpec, WireFormat};
use crate::traits::LlmProvider;
use crate::wire::{self, anthropic};

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// An LLM provider that talks to one vendor's HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.anthropic.com"`).
    api_base: String,
    api_key: String,
    /// Extra headers to send with each request.
    extra_headers: HeaderMap,
    timeout_secs: u64,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.spec.display_name)
            .field("api_base", &self.api_base)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new HttpProvider from a provider config and spec.
    ///
    /// # Arguments
    /// * `config`       - User's config (api_key, api_base, extra_headers)
    /// * `spec`         - Static provider spec from the registry
    /// * `timeout_secs` - Whole-request timeout
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::NotConfigured(spec.name.to_string()));
        }

        // Resolve API base: config > spec default
        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                if let (Ok(name), Ok(val)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    extra_headers.insert(name, val);
                } else {
                    warn!(provider = spec.name, header = %key, "Invalid extra header, dropping");
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            extra_headers,
            timeout_secs,
            spec,
        })
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, model: &str) -> String {
        wire::endpoint(self.spec.wire, &self.api_base, model)
    }

    /// Attach the API key where the vendor expects it.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = match self.spec.auth {
            AuthStyle::Bearer => builder.bearer_auth(&self.api_key),
            AuthStyle::XApiKey => builder.header("x-api-key", &self.api_key),
            AuthStyle::QueryKey => builder.query(&[("key", self.api_key.as_str())]),
        };
        if self.spec.wire == WireFormat::Anthropic {
            builder.header("anthropic-version", anthropic::API_VERSION)
        } else {
            builder
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn complete(
        &self,
        model: &str,
        req: &CompletionRequest,
    ) -> Result<LlmResponse, ProviderError> {
        let max_tokens = clamp_max_tokens(model, self.spec, req.max_tokens);
        let body = wire::build_body(self.spec.wire, model, req, max_tokens)?;

        debug!(
            provider = self.spec.name,
            model = model,
            task = %req.task,
            max_tokens,
            "Calling LLM"
        );

        let request = self
            .client
            .post(self.url(model))
            .headers(self.extra_headers.clone())
            .json(&body);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(provider = self.spec.name, "Rate limited by provider");
            return Err(ProviderError::RateLimited(wire::error_message(&text)));
        }
        if !status.is_success() {
            let message = wire::error_message(&text);
            error!(
                provider = self.spec.name,
                status = status.as_u16(),
                error = %message,
                "API error"
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = wire::parse_body(self.spec.wire, &text)?;
        debug!(
            provider = self.spec.name,
            model = model,
            chars = parsed.text.len(),
            finish_reason = parsed.finish_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );

        Ok(LlmResponse {
            content: parsed.text.trim().to_string(),
            model: model.to_string(),
            provider: self.spec.name.to_string(),
            finish_reason: parsed.finish_reason,
            usage: parsed.usage,
            cached: false,
        })
    }

    fn name(&self) -> &str {
        self.spec.name
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }

    fn default_model(&self) -> &str {
        self.spec.default_model
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider for a registry name from the providers config.
pub fn create_provider(
    name: &str,
    providers: &ProvidersConfig,
    timeout_secs: u64,
) -> Result<HttpProvider, ProviderError> {
    let spec = find_by_name(name).ok_or_else(|| ProviderError::NotConfigured(name.to_string()))?;
    let config = providers
        .get_by_name(spec.name)
        .ok_or_else(|| ProviderError::NotConfigured(name.to_string()))?;

    debug!(
        provider = spec.display_name,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        key = %mask_api_key(&config.api_key),
        "Creating LLM provider"
    );

    HttpProvider::new(config, spec, timeout_secs)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
