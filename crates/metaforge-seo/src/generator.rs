//! SEO generator: prompt, call, clean, persist for one post.

use std::sync::Arc;

use tracing::{debug, info, warn};

use metaforge_core::config::SeoConfig;
use metaforge_core::postmeta::MetaStore;
use metaforge_core::types::{PostContent, TaskType};
use metaforge_core::utils;
use metaforge_providers::{AiConnector, GenerateOptions};

use crate::error::SeoError;
use crate::postprocess::{self, GeneratedValue};
use crate::prompts;

/// Provider that produced the most recent field.
pub const META_PROVIDER: &str = "_metaforge_provider";
/// Model that produced the most recent field.
pub const META_MODEL: &str = "_metaforge_model";
/// RFC 3339 time of the most recent generation.
pub const META_GENERATED_AT: &str = "_metaforge_generated_at";

#[derive(Clone, Debug, Default)]
pub struct GenerationOptions {
    /// Generate and clean, but write nothing to the store.
    pub dry_run: bool,
    /// Regenerate even when a value is stored, regardless of `overwrite_existing`.
    pub force: bool,
    /// Routing overrides passed through to the connector.
    pub ai: GenerateOptions,
}

/// One freshly generated field.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedField {
    pub task: TaskType,
    pub value: GeneratedValue,
    pub provider: String,
    pub model: String,
    pub cached: bool,
    /// Whether the value was written to the store.
    pub persisted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GenerationOutcome {
    Generated(GeneratedField),
    /// A value was already stored and overwriting is off.
    Skipped { task: TaskType, existing: String },
}

impl GenerationOutcome {
    pub fn task(&self) -> TaskType {
        match self {
            GenerationOutcome::Generated(field) => field.task,
            GenerationOutcome::Skipped { task, .. } => *task,
        }
    }
}

pub struct SeoGenerator {
    connector: Arc<AiConnector>,
    store: Arc<dyn MetaStore>,
    seo: SeoConfig,
}

impl SeoGenerator {
    pub fn new(connector: Arc<AiConnector>, store: Arc<dyn MetaStore>, seo: SeoConfig) -> Self {
        SeoGenerator {
            connector,
            store,
            seo,
        }
    }

    pub fn store(&self) -> &Arc<dyn MetaStore> {
        &self.store
    }

    pub fn seo_config(&self) -> &SeoConfig {
        &self.seo
    }

    /// Generate one field for `post`.
    pub async fn generate(
        &self,
        post: &PostContent,
        task: TaskType,
        opts: &GenerationOptions,
    ) -> Result<GenerationOutcome, SeoError> {
        if !(opts.force || self.seo.overwrite_existing) {
            if let Some(existing) = self.store.get(post.id, task.meta_key())? {
                if !existing.trim().is_empty() {
                    debug!(post_id = post.id, task = %task, "Field already set, skipping");
                    return Ok(GenerationOutcome::Skipped { task, existing });
                }
            }
        }

        let system = prompts::system_prompt(task, &self.seo);
        let user = prompts::build_user_prompt(task, post, self.seo.content_sample_chars);

        let response = self.connector.generate(task, &system, &user, &opts.ai).await?;
        let value = postprocess::clean(task, &response.content, &self.seo)?;

        let persisted = !opts.dry_run;
        if persisted {
            self.store.set(post.id, task.meta_key(), &value.to_meta_value())?;
            self.store.set(post.id, META_PROVIDER, &response.provider)?;
            self.store.set(post.id, META_MODEL, &response.model)?;
            self.store.set(post.id, META_GENERATED_AT, &utils::timestamp())?;
        }

        info!(
            post_id = post.id,
            task = %task,
            provider = %response.provider,
            model = %response.model,
            cached = response.cached,
            dry_run = opts.dry_run,
            "Generated SEO field"
        );

        Ok(GenerationOutcome::Generated(GeneratedField {
            task,
            value,
            provider: response.provider,
            model: response.model,
            cached: response.cached,
            persisted,
        }))
    }

    /// Run `tasks` in order. A failed task is logged and does not stop the rest.
    pub async fn generate_all(
        &self,
        post: &PostContent,
        tasks: &[TaskType],
        opts: &GenerationOptions,
    ) -> Vec<(TaskType, Result<GenerationOutcome, SeoError>)> {
        let mut results = Vec::with_capacity(tasks.len());
        for &task in tasks {
            let result = self.generate(post, task, opts).await;
            if let Err(e) = &result {
                warn!(post_id = post.id, task = %task, error = %e, "SEO generation failed");
            }
            results.push((task, result));
        }
        results
    }
}
