//! OpenAI Chat Completions API.

use serde::{Deserialize, Serialize};

use metaforge_core::types::{CompletionRequest, UsageInfo};

use super::{decode, ParsedText};
use crate::error::ProviderError;

pub fn endpoint(base: &str) -> String {
    format!("{}/chat/completions", base)
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub fn build_request(model: &str, req: &CompletionRequest, max_tokens: u32) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(2);
    if !req.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: req.system_prompt.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: req.prompt.clone(),
    });

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        max_tokens,
        temperature: req.temperature.clamp(0.0, 2.0),
    }
}

pub fn parse_response(body: &str) -> Result<ParsedText, ProviderError> {
    let resp: ChatCompletionResponse = decode(body)?;
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    Ok(ParsedText {
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
        usage: resp.usage.map(|u| UsageInfo {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}
