//! `metaforge cache`: inspect and clean the response cache.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use metaforge_core::cache::ResponseCache;
use metaforge_core::config::Config;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show entry counts and size
    Stats,
    /// Delete every cached response
    Clear,
    /// Delete expired responses only
    Purge,
}

pub fn dispatch(config: &Config, action: CacheCommands) -> Result<()> {
    let cache = ResponseCache::new(None, config.ai.cache.ttl_secs)
        .context("failed to open response cache")?;

    match action {
        CacheCommands::Stats => {
            let stats = cache.stats();
            println!("  {:<12} {}", "Location:".bold(), cache.dir().display());
            println!("  {:<12} {}", "Entries:".bold(), stats.entries);
            println!("  {:<12} {}", "Expired:".bold(), stats.expired);
            println!("  {:<12} {} bytes", "Size:".bold(), stats.total_bytes);
            if !config.ai.cache.enabled {
                println!("  {}", "caching is disabled in config".dimmed());
            }
        }
        CacheCommands::Clear => {
            let removed = cache.clear();
            println!("  {} removed {} cached responses", "✓".green(), removed);
        }
        CacheCommands::Purge => {
            let removed = cache.purge_expired();
            println!("  {} purged {} expired responses", "✓".green(), removed);
        }
    }
    Ok(())
}
