//! Google Gemini `generateContent` API.

use serde::{Deserialize, Serialize};

use metaforge_core::types::{CompletionRequest, UsageInfo};

use super::{decode, ParsedText};
use crate::error::ProviderError;

/// The API key travels as `?key=`; the model is part of the path.
pub fn endpoint(base: &str, model: &str) -> String {
    format!("{}/v1beta/models/{}:generateContent", base, model)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    /// Absent for blocked or empty candidates
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(String::from),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

pub fn build_request(req: &CompletionRequest, max_tokens: u32) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![text_content(Some("user"), &req.prompt)],
        system_instruction: (!req.system_prompt.is_empty())
            .then(|| text_content(None, &req.system_prompt)),
        generation_config: GenerationConfig {
            temperature: req.temperature.clamp(0.0, 2.0),
            max_output_tokens: max_tokens,
        },
    }
}

pub fn parse_response(body: &str) -> Result<ParsedText, ProviderError> {
    let resp: GenerateContentResponse = decode(body)?;
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        // Prompt-level blocks come back without candidates
        .ok_or(ProviderError::EmptyResponse)?;

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(ParsedText {
        text,
        finish_reason: candidate.finish_reason,
        usage: resp.usage_metadata.map(|u| UsageInfo {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count.unwrap_or(0),
        }),
    })
}
