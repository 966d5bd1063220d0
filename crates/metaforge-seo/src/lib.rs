//! SEO generation for Metaforge.
//!
//! Turns a post into metadata fields by way of the provider layer:
//!
//! - [`prompts`]: system prompt per task + the user prompt built from a post
//! - [`postprocess`]: cleans raw model output into a storable value
//! - [`generator::SeoGenerator`]: one post, one or more tasks, persisted to a `MetaStore`
//! - [`batch::run_batch`]: many posts, sequentially, with a summary report

pub mod batch;
pub mod error;
pub mod generator;
pub mod postprocess;
pub mod prompts;

pub use batch::{run_batch, BatchReport};
pub use error::SeoError;
pub use generator::{GeneratedField, GenerationOptions, GenerationOutcome, SeoGenerator};
pub use postprocess::GeneratedValue;
