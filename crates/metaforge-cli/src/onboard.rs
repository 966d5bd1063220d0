//! `metaforge onboard`: initialize configuration and data directories.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use metaforge_core::config::{get_config_path, save_config, Config};
use metaforge_core::utils::{get_cache_path, get_data_path, get_postmeta_path};

/// Run the onboard command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    crate::helpers::print_header("Metaforge Setup");

    let config_path = config_path
        .map(crate::helpers::expand_tilde)
        .unwrap_or_else(get_config_path);

    // 1. Config with defaults (env-provided keys are not written to disk)
    if config_path.exists() {
        println!("  {} config already exists at {}", "✓".green(), config_path.display());
    } else {
        save_config(&Config::default(), Some(&config_path))
            .with_context(|| format!("failed to write config to {}", config_path.display()))?;
        println!("  {} created config at {}", "✓".green(), config_path.display());
    }

    // 2. Data directories
    for (label, dir) in [
        ("data dir", get_data_path()),
        ("cache dir", get_cache_path()),
        ("post-meta dir", get_postmeta_path()),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        println!("  {} {} at {}", "✓".green(), label, dir.display());
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Add an API key (e.g. ANTHROPIC_API_KEY) and run `metaforge status`.".green()
    );
    println!();

    Ok(())
}
