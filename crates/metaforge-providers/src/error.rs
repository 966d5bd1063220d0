//! Error types for provider calls and the fallback connector.

use thiserror::Error;

/// A single provider call failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider has no API key, or the name is unknown.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Non-success HTTP status from the vendor.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 429.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    #[error("timeout after {0}s")]
    Timeout(u64),

    /// Body did not match the vendor's response shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Well-formed response without any generated text.
    #[error("empty response from provider")]
    EmptyResponse,
}

/// Every attempt in the fallback chain failed, or there was nothing to try.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("no AI provider configured (set an API key for claude, openai, or gemini)")]
    NoProviders,

    #[error("{}", format_failures(.0))]
    AllProvidersFailed(Vec<(String, ProviderError)>),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ConnectorError {
    /// Per-provider failures, in attempt order (empty for other variants).
    pub fn failures(&self) -> &[(String, ProviderError)] {
        match self {
            ConnectorError::AllProvidersFailed(failures) => failures,
            _ => &[],
        }
    }
}

fn format_failures(failures: &[(String, ProviderError)]) -> String {
    let parts: Vec<String> = failures
        .iter()
        .map(|(provider, err)| format!("{}: {}", provider, err))
        .collect();
    format!("all AI providers failed [{}]", parts.join("; "))
}
