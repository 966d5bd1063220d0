//! Cleans raw model output into the value stored for each task.
//!
//! Models wrap answers in quotes, prefix labels ("Title: ..."), number their
//! lists, and overshoot length limits. Everything here is deterministic text
//! handling; no second model call.

use std::sync::OnceLock;

use regex::Regex;

use metaforge_core::config::SeoConfig;
use metaforge_core::types::TaskType;
use metaforge_core::utils::{collapse_whitespace, truncate_at_word};

use crate::error::SeoError;

/// A cleaned result, ready to persist.
#[derive(Clone, Debug, PartialEq)]
pub enum GeneratedValue {
    /// Title, description, or summary.
    Text(String),
    Keywords(Vec<String>),
    Suggestions(Vec<String>),
}

impl GeneratedValue {
    /// The post-meta representation: keywords comma-joined, suggestions as a JSON array.
    pub fn to_meta_value(&self) -> String {
        match self {
            GeneratedValue::Text(text) => text.clone(),
            GeneratedValue::Keywords(keywords) => keywords.join(", "),
            GeneratedValue::Suggestions(items) => serde_json::Value::from(items.clone()).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GeneratedValue::Text(text) => text.is_empty(),
            GeneratedValue::Keywords(items) | GeneratedValue::Suggestions(items) => items.is_empty(),
        }
    }
}

/// Clean `raw` model output for `task` using the configured limits.
pub fn clean(task: TaskType, raw: &str, seo: &SeoConfig) -> Result<GeneratedValue, SeoError> {
    let value = match task {
        TaskType::MetaTitle => {
            GeneratedValue::Text(single_line(raw, &["meta title", "title"], seo.title_max_length))
        }
        TaskType::MetaDescription => GeneratedValue::Text(single_line(
            raw,
            &["meta description", "description"],
            seo.description_max_length,
        )),
        TaskType::KeywordAnalysis => GeneratedValue::Keywords(keywords(raw, seo.max_keywords)),
        TaskType::ContentSuggestions => {
            GeneratedValue::Suggestions(suggestions(raw, seo.max_suggestions))
        }
        TaskType::ContentSummary => {
            let text = strip_label(&collapse_whitespace(raw), &["summary"]);
            GeneratedValue::Text(truncate_at_word(strip_quotes(&text), seo.summary_max_length))
        }
    };

    if value.is_empty() {
        return Err(SeoError::EmptyOutput(task));
    }
    Ok(value)
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// First line with content once label and quotes are removed, truncated.
/// A bare `Title:` line is skipped so the value on the next line is used.
fn single_line(raw: &str, labels: &[&str], max_chars: usize) -> String {
    let line = raw
        .lines()
        .map(|l| {
            let line = strip_markdown(l.trim());
            let line = strip_label(strip_quotes(&line), labels);
            strip_quotes(&line).to_string()
        })
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    truncate_at_word(&line, max_chars)
}

fn keywords(raw: &str, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(|c| c == ',' || c == '\n' || c == ';') {
        if out.len() >= max {
            break;
        }
        let item = strip_label(&strip_bullet(item.trim()), &["focus keywords", "keywords"]);
        let keyword = strip_quotes(strip_markdown(&item).as_str()).trim().to_lowercase();
        let keyword = keyword.trim_end_matches('.').trim().to_string();
        if keyword.is_empty() || out.contains(&keyword) {
            continue;
        }
        out.push(keyword);
    }
    out
}

fn suggestions(raw: &str, max: usize) -> Vec<String> {
    raw.lines()
        .map(|l| strip_quotes(&strip_markdown(&strip_bullet(l.trim()))).to_string())
        // Header lines like "Suggestions:" carry no content
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .take(max)
        .collect()
}

/// Remove one pair of surrounding quotes (straight or typographic).
fn strip_quotes(s: &str) -> &str {
    const PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’'), ('«', '»')];
    let s = s.trim();
    for (open, close) in PAIRS {
        if let Some(inner) = s.strip_prefix(*open).and_then(|r| r.strip_suffix(*close)) {
            return inner.trim();
        }
    }
    s
}

/// Drop a leading `Label:` (case-insensitive) if present.
fn strip_label(s: &str, labels: &[&str]) -> String {
    let trimmed = s.trim_start();
    for label in labels {
        let Some(head) = trimmed.get(..label.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(label) {
            if let Some(value) = trimmed[label.len()..].trim_start().strip_prefix(':') {
                return value.trim().to_string();
            }
        }
    }
    trimmed.trim_end().to_string()
}

/// Drop list markers: `-`, `*`, `•`, `1.`, `2)`.
fn strip_bullet(s: &str) -> String {
    static BULLET: OnceLock<Option<Regex>> = OnceLock::new();
    match BULLET.get_or_init(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+").ok()) {
        Some(re) => re.replace(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Drop bold/italic/code markers the model was told not to use.
fn strip_markdown(s: &str) -> String {
    s.replace("**", "").replace('`', "").trim().to_string()
}
