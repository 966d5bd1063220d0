//! LLM provider trait: the seam between the connector and vendor clients.
//!
//! `HttpProvider` in `http_provider.rs` covers every vendor in the registry;
//! tests plug in scripted implementations.

use async_trait::async_trait;
use metaforge_core::types::{CompletionRequest, LlmResponse};

use crate::error::ProviderError;

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one completion request.
    ///
    /// # Arguments
    /// * `model` - Concrete model id (e.g. `"claude-sonnet-4-20250514"`).
    /// * `req`   - Prompts plus max_tokens / temperature.
    ///
    /// # Returns
    /// The generated text, or a `ProviderError` the connector can fall through on.
    async fn complete(&self, model: &str, req: &CompletionRequest)
        -> Result<LlmResponse, ProviderError>;

    /// Registry name (`"claude"`, `"openai"`, `"gemini"`).
    fn name(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;

    /// Model used when neither config nor the selector picks one.
    fn default_model(&self) -> &str;
}
