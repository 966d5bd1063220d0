//! Batch runner: many posts through the generator, one at a time.
//!
//! Scheduling belongs to the host; this only walks the list it is given.

use serde::Serialize;
use tracing::info;

use metaforge_core::types::{PostContent, TaskType};

use crate::generator::{GenerationOptions, GenerationOutcome, SeoGenerator};

/// One failed (post, task) pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchFailure {
    pub post_id: u64,
    pub task: TaskType,
    pub error: String,
}

/// Totals for a batch run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub posts: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Run `tasks` for every post, sequentially. Failures are counted, never fatal.
pub async fn run_batch(
    generator: &SeoGenerator,
    posts: &[PostContent],
    tasks: &[TaskType],
    opts: &GenerationOptions,
) -> BatchReport {
    let mut report = BatchReport::default();

    for post in posts {
        report.posts += 1;
        for (task, result) in generator.generate_all(post, tasks, opts).await {
            match result {
                Ok(GenerationOutcome::Generated(_)) => report.generated += 1,
                Ok(GenerationOutcome::Skipped { .. }) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    report.failures.push(BatchFailure {
                        post_id: post.id,
                        task,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        posts = report.posts,
        generated = report.generated,
        skipped = report.skipped,
        failed = report.failed,
        "Batch finished"
    );
    report
}
