//! `metaforge meta`: inspect stored post-meta.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use metaforge_core::postmeta::{JsonMetaStore, MetaStore};

#[derive(Subcommand)]
pub enum MetaCommands {
    /// Print every stored key for a post
    Show {
        /// Post id
        post_id: u64,
    },
}

pub fn dispatch(action: MetaCommands) -> Result<()> {
    match action {
        MetaCommands::Show { post_id } => show(&JsonMetaStore::new(None), post_id),
    }
}

fn show(store: &dyn MetaStore, post_id: u64) -> Result<()> {
    let meta = store.all(post_id)?;
    if meta.is_empty() {
        println!("  No post-meta stored for post {}", post_id);
        return Ok(());
    }

    println!();
    println!("{}", format!("Post {}", post_id).cyan().bold());
    for (key, value) in &meta {
        println!("  {:<34} {}", key.bold(), display_value(key, value));
    }
    println!();
    Ok(())
}

/// JSON arrays print one item per line; timestamps print in local time.
fn display_value(key: &str, value: &str) -> String {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
        return items
            .iter()
            .map(|item| format!("\n    - {}", item))
            .collect::<String>();
    }
    if key.ends_with("_generated_at") {
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
            return ts
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();
        }
    }
    value.to_string()
}
