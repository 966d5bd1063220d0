//! Prompt construction: one system prompt per task, one user prompt per post.

use metaforge_core::config::SeoConfig;
use metaforge_core::types::{PostContent, TaskType};
use metaforge_core::utils::{collapse_whitespace, strip_html, truncate_at_word};

const PREAMBLE: &str = "You are an SEO specialist writing metadata for web content. \
Write in the same language as the content. Reply with the requested output only: \
no preamble, no explanations, no markdown.";

/// System prompt for `task`, with the configured length limits spelled out.
pub fn system_prompt(task: TaskType, seo: &SeoConfig) -> String {
    let instructions = match task {
        TaskType::MetaTitle => format!(
            "Write one SEO meta title of at most {} characters. \
             Put the primary keyword near the start and make it compelling to click.",
            seo.title_max_length
        ),
        TaskType::MetaDescription => format!(
            "Write one SEO meta description of at most {} characters. \
             Summarize the page, include the primary keyword, and end with a reason to click.",
            seo.description_max_length
        ),
        TaskType::KeywordAnalysis => format!(
            "List up to {} focus keywords or keyphrases for this content, most important first, \
             as a single comma-separated line in lowercase.",
            seo.max_keywords
        ),
        TaskType::ContentSuggestions => format!(
            "Give up to {} concrete suggestions to improve this content's search performance, \
             one per line.",
            seo.max_suggestions
        ),
        TaskType::ContentSummary => format!(
            "Summarize this content in plain prose of at most {} characters.",
            seo.summary_max_length
        ),
    };
    format!("{}\n\n{}", PREAMBLE, instructions)
}

/// User prompt: title, excerpt (when present), and a plain-text sample of the body.
pub fn build_user_prompt(task: TaskType, post: &PostContent, sample_chars: usize) -> String {
    let mut prompt = format!("Title: {}\n", collapse_whitespace(&post.title));

    if let Some(excerpt) = post.excerpt.as_deref() {
        let excerpt = strip_html(excerpt);
        if !excerpt.is_empty() {
            prompt.push_str(&format!("Excerpt: {}\n", excerpt));
        }
    }

    let body = truncate_at_word(&strip_html(&post.content), sample_chars);
    if !body.is_empty() {
        prompt.push_str(&format!("\nContent:\n{}\n", body));
    }

    prompt.push_str(&format!("\nTask: {}", task_request(task)));
    prompt
}

fn task_request(task: TaskType) -> &'static str {
    match task {
        TaskType::MetaTitle => "write the meta title.",
        TaskType::MetaDescription => "write the meta description.",
        TaskType::KeywordAnalysis => "list the focus keywords.",
        TaskType::ContentSuggestions => "list the improvement suggestions.",
        TaskType::ContentSummary => "write the summary.",
    }
}
