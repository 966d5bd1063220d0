//! Anthropic Messages API.

use serde::{Deserialize, Serialize};

use metaforge_core::types::{CompletionRequest, UsageInfo};

use super::{decode, ParsedText};
use crate::error::ProviderError;

/// Anthropic API version header value.
pub const API_VERSION: &str = "2023-06-01";

pub fn endpoint(base: &str) -> String {
    format!("{}/v1/messages", base)
}

#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<InputMessage>,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct InputMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

/// Only `text` blocks carry output; other block types are skipped.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

pub fn build_request(model: &str, req: &CompletionRequest, max_tokens: u32) -> MessagesRequest {
    MessagesRequest {
        model: model.to_string(),
        max_tokens,
        system: (!req.system_prompt.is_empty()).then(|| req.system_prompt.clone()),
        messages: vec![InputMessage {
            role: "user",
            content: req.prompt.clone(),
        }],
        // Anthropic caps temperature at 1.0
        temperature: req.temperature.clamp(0.0, 1.0),
    }
}

pub fn parse_response(body: &str) -> Result<ParsedText, ProviderError> {
    let resp: MessagesResponse = decode(body)?;
    let text = resp
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    Ok(ParsedText {
        text,
        finish_reason: resp.stop_reason,
        usage: resp.usage.map(|u| UsageInfo {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
    })
}
