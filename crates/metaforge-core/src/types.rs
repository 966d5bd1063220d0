//! Core types for Metaforge: task labels, selection preferences, content items,
//! and the provider-agnostic request/response pair.
//!
//! Every provider speaks a different JSON dialect; these types are the common
//! ground the router, the SEO generator, and the CLI all share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────
// TaskType
// ─────────────────────────────────────────────

/// What a generation call is for.
///
/// Selects the system prompt, biases model selection, and decides which
/// post-meta key the cleaned output lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    MetaTitle,
    MetaDescription,
    KeywordAnalysis,
    ContentSuggestions,
    ContentSummary,
}

impl TaskType {
    /// All task types, in generation order.
    pub const ALL: [TaskType; 5] = [
        TaskType::MetaTitle,
        TaskType::MetaDescription,
        TaskType::KeywordAnalysis,
        TaskType::ContentSuggestions,
        TaskType::ContentSummary,
    ];

    /// Snake-case label (e.g. `"meta_title"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::MetaTitle => "meta_title",
            TaskType::MetaDescription => "meta_description",
            TaskType::KeywordAnalysis => "keyword_analysis",
            TaskType::ContentSuggestions => "content_suggestions",
            TaskType::ContentSummary => "content_summary",
        }
    }

    /// Post-meta key the generated value is persisted under.
    pub fn meta_key(&self) -> &'static str {
        match self {
            TaskType::MetaTitle => "_metaforge_meta_title",
            TaskType::MetaDescription => "_metaforge_meta_description",
            TaskType::KeywordAnalysis => "_metaforge_focus_keywords",
            TaskType::ContentSuggestions => "_metaforge_content_suggestions",
            TaskType::ContentSummary => "_metaforge_summary",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = TaskType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown task type '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

// ─────────────────────────────────────────────
// Preferences
// ─────────────────────────────────────────────

/// Caller-supplied model selection flags. All false means "balanced".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub speed: bool,
    pub quality: bool,
    pub cost: bool,
}

impl Preferences {
    pub fn quality() -> Self {
        Self {
            quality: true,
            ..Default::default()
        }
    }

    pub fn speed() -> Self {
        Self {
            speed: true,
            ..Default::default()
        }
    }

    pub fn cost() -> Self {
        Self {
            cost: true,
            ..Default::default()
        }
    }

    /// Whether no flag is set.
    pub fn is_balanced(&self) -> bool {
        !self.speed && !self.quality && !self.cost
    }
}

// ─────────────────────────────────────────────
// PostContent
// ─────────────────────────────────────────────

/// A single content item handed over by the host CMS.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PostContent {
    pub id: u64,
    pub title: String,
    /// Raw body (may contain HTML).
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ─────────────────────────────────────────────
// Requests / responses
// ─────────────────────────────────────────────

/// Provider-agnostic generation request.
///
/// Each wire format turns this into its own payload shape.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub task: TaskType,
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(task: TaskType, system_prompt: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            task,
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Generated text plus bookkeeping, whichever provider produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Model id that produced the text.
    pub model: String,
    /// Provider name (`"claude"`, `"openai"`, `"gemini"`).
    pub provider: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
    /// Served from the response cache, no HTTP call made.
    pub cached: bool,
}

/// Token counts reported by the vendor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl UsageInfo {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
