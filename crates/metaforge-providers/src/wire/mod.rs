//! Wire formats: per-vendor request builders and response parsers.
//!
//! Each submodule turns a [`CompletionRequest`] into the vendor's JSON body
//! and pulls generated text back out of the vendor's response shape:
//!
//! - [`anthropic`]: `POST {base}/v1/messages`
//! - [`openai`]: `POST {base}/chat/completions`
//! - [`gemini`]: `POST {base}/v1beta/models/{model}:generateContent`

pub mod anthropic;
pub mod gemini;
pub mod openai;

use serde::Deserialize;

use metaforge_core::types::{CompletionRequest, UsageInfo};

use crate::error::ProviderError;
use crate::registry::WireFormat;

/// Text extracted from a vendor response.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedText {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

/// Endpoint URL (without auth) for a wire format.
pub fn endpoint(wire: WireFormat, api_base: &str, model: &str) -> String {
    let base = api_base.trim_end_matches('/');
    match wire {
        WireFormat::Anthropic => anthropic::endpoint(base),
        WireFormat::OpenAi => openai::endpoint(base),
        WireFormat::Gemini => gemini::endpoint(base, model),
    }
}

/// Request body for a wire format.
pub fn build_body(
    wire: WireFormat,
    model: &str,
    req: &CompletionRequest,
    max_tokens: u32,
) -> Result<serde_json::Value, ProviderError> {
    let body = match wire {
        WireFormat::Anthropic => serde_json::to_value(anthropic::build_request(model, req, max_tokens)),
        WireFormat::OpenAi => serde_json::to_value(openai::build_request(model, req, max_tokens)),
        WireFormat::Gemini => serde_json::to_value(gemini::build_request(req, max_tokens)),
    };
    body.map_err(|e| ProviderError::InvalidResponse(format!("failed to encode request: {}", e)))
}

/// Parse a success body for a wire format.
pub fn parse_body(wire: WireFormat, body: &str) -> Result<ParsedText, ProviderError> {
    let parsed = match wire {
        WireFormat::Anthropic => anthropic::parse_response(body)?,
        WireFormat::OpenAi => openai::parse_response(body)?,
        WireFormat::Gemini => gemini::parse_response(body)?,
    };
    if parsed.text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(parsed)
}

/// All three vendors report failures as `{"error": {"message": "..."}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Best-effort human message from an error body; falls back to the raw text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no error body".to_string(),
        Err(_) => body.trim().chars().take(500).collect(),
    }
}

pub(crate) fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
