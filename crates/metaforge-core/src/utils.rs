//! Utility helpers: path resolution, timestamps, text truncation and cleanup.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Get the Metaforge data directory (e.g. `~/.metaforge/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".metaforge")
}

/// Get the response cache directory (e.g. `~/.metaforge/cache/`).
pub fn get_cache_path() -> PathBuf {
    get_data_path().join("cache")
}

/// Get the post-meta directory (e.g. `~/.metaforge/postmeta/`).
pub fn get_postmeta_path() -> PathBuf {
    get_data_path().join("postmeta")
}

/// Get current ISO 8601 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Truncate to at most `max_chars` characters, preferring a word boundary.
///
/// Cuts at the last whitespace inside the limit and drops dangling
/// punctuation; falls back to a hard cut when the limit holds a single word.
/// Unicode-safe, never appends an ellipsis.
pub fn truncate_at_word(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let head: String = s.chars().take(max_chars).collect();
    // If the next char is whitespace, the head already ends on a word boundary.
    let next_is_space = s
        .chars()
        .nth(max_chars)
        .map_or(false, char::is_whitespace);

    let cut = if next_is_space {
        head.as_str()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(pos) if pos > 0 => &head[..pos],
            _ => head.as_str(),
        }
    };

    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
        .to_string()
}

/// Convert HTML (and builder shortcodes) to plain text with collapsed whitespace.
pub fn strip_html(html: &str) -> String {
    // Applied in order: script and style bodies first, then tags, then shortcodes
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?is)<script[^>]*>.*?</script>",
            r"(?is)<style[^>]*>.*?</style>",
            r"<[^>]+>",
            r"\[/?[a-zA-Z_][\w-]*[^\]]*\]",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    let mut text = html.to_string();
    for re in patterns {
        text = re.replace_all(&text, " ").into_owned();
    }

    // Unescape common HTML entities (&amp; last so "&amp;lt;" stays literal)
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&");

    collapse_whitespace(&text)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mask an API key for display: first 4 and last 4 characters.
pub fn mask_api_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}...{}", head, tail)
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
