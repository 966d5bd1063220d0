//! Metaforge CLI: entry point.
//!
//! # Commands
//!
//! - `metaforge onboard`: write a default config and create data dirs
//! - `metaforge status`: show configuration, provider chain, and cache status
//! - `metaforge generate --post FILE`: generate SEO fields for one post
//! - `metaforge batch --dir DIR`: generate for every post file in a directory
//! - `metaforge cache stats|clear|purge`: manage the response cache
//! - `metaforge meta show ID`: print stored post-meta
//! - `metaforge test-provider NAME`: connection test against one provider

mod cache_cmd;
mod generate_cmd;
mod helpers;
mod meta_cmd;
mod onboard;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use metaforge_core::config::{load_config, Config};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Metaforge: AI-generated SEO metadata with multi-provider fallback
#[derive(Parser)]
#[command(name = "metaforge", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.metaforge/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directories
    Onboard,

    /// Show configuration, provider chain, and cache status
    Status,

    /// Generate SEO fields for one post (JSON file)
    Generate(generate_cmd::GenerateArgs),

    /// Generate SEO fields for every *.json post in a directory
    Batch(generate_cmd::BatchArgs),

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: cache_cmd::CacheCommands,
    },

    /// Inspect stored post-meta
    Meta {
        #[command(subcommand)]
        action: meta_cmd::MetaCommands,
    },

    /// Send a tiny prompt to one provider to check connectivity
    TestProvider {
        /// Provider name (claude, openai, gemini)
        name: String,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_path = cli.config.as_deref();
    let config = || -> Config { load_config(config_path) };

    match cli.command {
        Commands::Onboard => onboard::run(config_path),
        Commands::Status => status::run(&config(), config_path),
        Commands::Generate(args) => generate_cmd::run_generate(&config(), args).await,
        Commands::Batch(args) => generate_cmd::run_batch(&config(), args).await,
        Commands::Cache { action } => cache_cmd::dispatch(&config(), action),
        Commands::Meta { action } => meta_cmd::dispatch(action),
        Commands::TestProvider { name } => generate_cmd::run_test_provider(&config(), &name).await,
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("metaforge=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
