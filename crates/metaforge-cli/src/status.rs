//! `metaforge status`: show configuration, provider chain, and cache status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use metaforge_core::cache::ResponseCache;
use metaforge_core::config::{get_config_path, Config};
use metaforge_core::types::{Preferences, TaskType};
use metaforge_core::utils::mask_api_key;
use metaforge_providers::models::select_model;
use metaforge_providers::registry::{build_chain, PROVIDERS};

/// Run the status command.
pub fn run(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let config_path = config_path
        .map(crate::helpers::expand_tilde)
        .unwrap_or_else(get_config_path);

    crate::helpers::print_header("Metaforge Status");

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Chain
    let providers_map = config.providers.to_map();
    let chain: Vec<&str> = build_chain(&config.ai, &providers_map)
        .iter()
        .map(|spec| spec.name)
        .collect();
    println!(
        "  {:<18} {} {}",
        "Primary:".bold(),
        config.ai.primary_provider,
        if config.ai.enable_fallback {
            format!("→ {}", config.ai.fallback_providers.join(" → ")).dimmed()
        } else {
            "(fallback disabled)".dimmed()
        }
    );
    println!(
        "  {:<18} {}",
        "Active chain:".bold(),
        if chain.is_empty() {
            "none (no provider has an API key)".red().to_string()
        } else {
            chain.join(" → ")
        }
    );
    println!(
        "  {:<18} {} | max_tokens: {} | min delay: {}ms",
        "Parameters:".bold(),
        format!("temp: {}", config.ai.temperature).dimmed(),
        format!("{}", config.ai.max_tokens).dimmed(),
        format!("{}", config.ai.rate_limit.min_delay_ms).dimmed(),
    );
    println!(
        "  {:<18} {}",
        "Preferences:".bold(),
        describe_preferences(&config.ai.preferences)
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let Some(pc) = providers_map.get(spec.name).filter(|pc| pc.is_configured()) else {
            println!(
                "    {:<20} {}",
                spec.display_name,
                format!("· not configured (set {})", spec.env_key).dimmed()
            );
            continue;
        };
        println!(
            "    {:<20} {} {}",
            spec.display_name,
            "✓".green(),
            format!("key {}", mask_api_key(&pc.api_key)).dimmed()
        );
        match &pc.model {
            Some(model) => println!("      {:<22} {} {}", "all tasks", model, "(pinned)".dimmed()),
            None => {
                for task in TaskType::ALL {
                    println!(
                        "      {:<22} {}",
                        task.as_str(),
                        select_model(spec, task, &config.ai.preferences)
                    );
                }
            }
        }
    }

    // Cache
    println!();
    if config.ai.cache.enabled {
        match ResponseCache::new(None, config.ai.cache.ttl_secs) {
            Ok(cache) => {
                let stats = cache.stats();
                println!(
                    "  {:<18} {} entries ({} expired, {} bytes) at {}",
                    "Cache:".bold(),
                    stats.entries,
                    stats.expired,
                    stats.total_bytes,
                    cache.dir().display()
                );
            }
            Err(e) => println!("  {:<18} {}", "Cache:".bold(), format!("unavailable: {}", e).red()),
        }
    } else {
        println!("  {:<18} {}", "Cache:".bold(), "disabled".dimmed());
    }

    println!();
    Ok(())
}

fn describe_preferences(prefs: &Preferences) -> String {
    if prefs.is_balanced() {
        return "balanced".to_string();
    }
    let mut flags = Vec::new();
    if prefs.speed {
        flags.push("speed");
    }
    if prefs.quality {
        flags.push("quality");
    }
    if prefs.cost {
        flags.push("cost");
    }
    flags.join(" + ")
}
