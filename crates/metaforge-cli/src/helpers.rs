//! Shared CLI helpers: path expansion, post loading, field printing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use metaforge_core::types::PostContent;
use metaforge_seo::{GeneratedValue, GenerationOutcome, SeoError};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if s == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

/// Read one post from a JSON file.
pub fn load_post(path: &Path) -> Result<PostContent> {
    let path = expand_tilde(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read post file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid post JSON in {}", path.display()))
}

/// Read every `*.json` post in `dir`, sorted by file name.
pub fn load_posts_dir(dir: &Path) -> Result<Vec<PostContent>> {
    let dir = expand_tilde(dir);
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    paths.iter().map(|p| load_post(p)).collect()
}

/// Section header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!();
}

/// `✓` or a dimmed `·`.
pub fn mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "·".dimmed().to_string()
    }
}

/// Print one task result under a post.
pub fn print_outcome(result: &Result<GenerationOutcome, SeoError>, task: &str) {
    match result {
        Ok(GenerationOutcome::Generated(field)) => {
            let source = if field.cached {
                format!("{} / {} (cached)", field.provider, field.model)
            } else {
                format!("{} / {}", field.provider, field.model)
            };
            println!("  {} {:<20} {}", "✓".green(), task.bold(), source.dimmed());
            print_value(&field.value);
        }
        Ok(GenerationOutcome::Skipped { existing, .. }) => {
            println!("  {} {:<20} {}", "·".dimmed(), task.bold(), "skipped (already set)".dimmed());
            println!("      {}", existing.dimmed());
        }
        Err(e) => {
            println!("  {} {:<20} {}", "✗".red(), task.bold(), e.to_string().red());
        }
    }
}

fn print_value(value: &GeneratedValue) {
    match value {
        GeneratedValue::Text(text) => println!("      {}", text),
        GeneratedValue::Keywords(keywords) => println!("      {}", keywords.join(", ")),
        GeneratedValue::Suggestions(items) => {
            for item in items {
                println!("      - {}", item);
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde(Path::new("~/posts/1.json"));
        assert!(result.ends_with("posts/1.json"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde(Path::new("/absolute/path"));
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn load_post_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("7.json");
        std::fs::write(&path, r#"{"id": 7, "title": "Hello", "content": "<p>Body</p>"}"#).unwrap();

        let post = load_post(&path).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.title, "Hello");
        assert!(post.excerpt.is_none());
    }

    #[test]
    fn load_post_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_post(&path).unwrap_err();
        assert!(err.to_string().contains("invalid post JSON"));
    }

    #[test]
    fn load_posts_dir_sorted_json_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"id": 2, "title": "B"}"#).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"id": 1, "title": "A"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let posts = load_posts_dir(dir.path()).unwrap();
        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
