//! `metaforge generate`, `metaforge batch`, and `metaforge test-provider`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use tracing::info;

use metaforge_core::config::Config;
use metaforge_core::postmeta::JsonMetaStore;
use metaforge_core::types::{Preferences, TaskType};
use metaforge_providers::{AiConnector, ConnectorError, GenerateOptions};
use metaforge_seo::{run_batch as run_seo_batch, GenerationOptions, SeoGenerator};

use crate::helpers;

/// Model selection bias for `--prefer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Prefer {
    Speed,
    Quality,
    Cost,
}

/// Flags shared by `generate` and `batch`.
#[derive(Args, Debug)]
pub struct RoutingArgs {
    /// Task to run (repeatable). Defaults to every task.
    #[arg(long = "task", value_name = "TASK")]
    pub tasks: Vec<TaskType>,

    /// Use only this provider instead of the configured chain
    #[arg(long)]
    pub provider: Option<String>,

    /// Force a model id
    #[arg(long)]
    pub model: Option<String>,

    /// Model selection bias (repeatable)
    #[arg(long, value_enum)]
    pub prefer: Vec<Prefer>,

    /// Bypass the response cache
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Generate and print, but store nothing
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Regenerate fields that already have a value
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Post JSON file: {"id", "title", "content", "excerpt"?, "url"?}
    #[arg(long)]
    pub post: PathBuf,

    #[command(flatten)]
    pub routing: RoutingArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of post JSON files
    #[arg(long)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub routing: RoutingArgs,
}

impl RoutingArgs {
    fn tasks(&self) -> Vec<TaskType> {
        if self.tasks.is_empty() {
            TaskType::ALL.to_vec()
        } else {
            self.tasks.clone()
        }
    }

    fn options(&self) -> GenerationOptions {
        GenerationOptions {
            dry_run: self.dry_run,
            force: self.force,
            ai: GenerateOptions {
                provider: self.provider.clone(),
                model: self.model.clone(),
                preferences: preferences(&self.prefer),
                skip_cache: self.no_cache,
                ..Default::default()
            },
        }
    }
}

fn preferences(flags: &[Prefer]) -> Option<Preferences> {
    if flags.is_empty() {
        return None;
    }
    Some(Preferences {
        speed: flags.contains(&Prefer::Speed),
        quality: flags.contains(&Prefer::Quality),
        cost: flags.contains(&Prefer::Cost),
    })
}

/// Connector from config; fails early when nothing could ever be called.
fn build_connector(config: &Config, forced: Option<&str>) -> Result<Arc<AiConnector>> {
    let connector = AiConnector::from_config(config);
    if forced.is_none() && connector.chain_names().is_empty() {
        return Err(ConnectorError::NoProviders.into());
    }
    info!(chain = ?connector.chain_names(), "Provider chain ready");
    Ok(Arc::new(connector))
}

fn build_generator(config: &Config, routing: &RoutingArgs) -> Result<SeoGenerator> {
    let connector = build_connector(config, routing.provider.as_deref())?;
    let store = Arc::new(JsonMetaStore::new(None));
    Ok(SeoGenerator::new(connector, store, config.seo.clone()))
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

pub async fn run_generate(config: &Config, args: GenerateArgs) -> Result<()> {
    let post = helpers::load_post(&args.post)?;
    let generator = build_generator(config, &args.routing)?;
    let opts = args.routing.options();

    helpers::print_header(&format!("Post {}: {}", post.id, post.title));
    if opts.dry_run {
        println!("  {}", "dry run: nothing will be stored".yellow());
    }

    let results = generator
        .generate_all(&post, &args.routing.tasks(), &opts)
        .await;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    for (task, result) in &results {
        helpers::print_outcome(result, task.as_str());
    }
    println!();

    if failed > 0 {
        bail!("{} of {} tasks failed", failed, results.len());
    }
    Ok(())
}

pub async fn run_batch(config: &Config, args: BatchArgs) -> Result<()> {
    let posts = helpers::load_posts_dir(&args.dir)?;
    if posts.is_empty() {
        println!("No post files found in {}", args.dir.display());
        return Ok(());
    }

    let generator = build_generator(config, &args.routing)?;
    let opts = args.routing.options();
    let tasks = args.routing.tasks();

    helpers::print_header(&format!("Batch: {} posts × {} tasks", posts.len(), tasks.len()));
    let report = run_seo_batch(&generator, &posts, &tasks, &opts).await;

    println!(
        "  {} generated   {} skipped   {} failed",
        report.generated.to_string().green(),
        report.skipped.to_string().dimmed(),
        if report.failed > 0 {
            report.failed.to_string().red()
        } else {
            report.failed.to_string().normal()
        }
    );
    for failure in &report.failures {
        println!(
            "  {} post {} {}: {}",
            "✗".red(),
            failure.post_id,
            failure.task,
            failure.error
        );
    }
    println!();

    if !report.is_success() {
        bail!("{} task(s) failed", report.failed);
    }
    Ok(())
}

pub async fn run_test_provider(config: &Config, name: &str) -> Result<()> {
    let connector = AiConnector::from_config(config);

    let started = Instant::now();
    let response = connector
        .test_provider(name)
        .await
        .with_context(|| format!("provider '{}' failed the connection test", name))?;

    println!(
        "  {} {} responded in {}ms via {}: {}",
        "✓".green(),
        name.bold(),
        started.elapsed().as_millis(),
        response.model,
        response.content.dimmed()
    );
    Ok(())
}
