//! Model capability table and preference-driven model selection.
//!
//! Scores are static heuristics, not benchmarks: `quality` and `speed` are on
//! a 1–10 scale, prices are USD per million tokens.

use metaforge_core::types::{Preferences, TaskType, UsageInfo};

use crate::registry::ProviderSpec;

/// Capabilities of one concrete model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub id: &'static str,
    /// Owning provider name (matches `ProviderSpec::name`).
    pub provider: &'static str,
    pub quality: u8,
    pub speed: u8,
    pub cost_per_mtok_input: f64,
    pub cost_per_mtok_output: f64,
    pub max_output_tokens: u32,
    pub context_window: u32,
    /// Tasks this model gets a selection bonus for.
    pub strengths: &'static [TaskType],
}

impl ModelSpec {
    /// Average of input and output price.
    fn blended_price(&self) -> f64 {
        (self.cost_per_mtok_input + self.cost_per_mtok_output) / 2.0
    }
}

use TaskType::*;

/// Every model the selector knows about, grouped by provider.
/// Within a provider, earlier rows win ties.
pub static MODELS: &[ModelSpec] = &[
    // Claude
    ModelSpec {
        id: "claude-3-5-haiku-20241022",
        provider: "claude",
        quality: 6,
        speed: 9,
        cost_per_mtok_input: 0.80,
        cost_per_mtok_output: 4.00,
        max_output_tokens: 8192,
        context_window: 200_000,
        strengths: &[MetaTitle, MetaDescription],
    },
    ModelSpec {
        id: "claude-sonnet-4-20250514",
        provider: "claude",
        quality: 8,
        speed: 7,
        cost_per_mtok_input: 3.00,
        cost_per_mtok_output: 15.00,
        max_output_tokens: 8192,
        context_window: 200_000,
        strengths: &[KeywordAnalysis, ContentSuggestions, ContentSummary],
    },
    ModelSpec {
        id: "claude-opus-4-20250514",
        provider: "claude",
        quality: 10,
        speed: 3,
        cost_per_mtok_input: 15.00,
        cost_per_mtok_output: 75.00,
        max_output_tokens: 8192,
        context_window: 200_000,
        strengths: &[ContentSuggestions],
    },
    // OpenAI
    ModelSpec {
        id: "gpt-4o-mini",
        provider: "openai",
        quality: 6,
        speed: 9,
        cost_per_mtok_input: 0.15,
        cost_per_mtok_output: 0.60,
        max_output_tokens: 16_384,
        context_window: 128_000,
        strengths: &[MetaTitle, MetaDescription],
    },
    ModelSpec {
        id: "gpt-4o",
        provider: "openai",
        quality: 8,
        speed: 7,
        cost_per_mtok_input: 2.50,
        cost_per_mtok_output: 10.00,
        max_output_tokens: 16_384,
        context_window: 128_000,
        strengths: &[KeywordAnalysis, ContentSuggestions],
    },
    ModelSpec {
        id: "gpt-4.1",
        provider: "openai",
        quality: 9,
        speed: 6,
        cost_per_mtok_input: 2.00,
        cost_per_mtok_output: 8.00,
        max_output_tokens: 32_768,
        context_window: 1_047_576,
        strengths: &[ContentSuggestions, ContentSummary],
    },
    // Gemini
    ModelSpec {
        id: "gemini-2.0-flash",
        provider: "gemini",
        quality: 7,
        speed: 10,
        cost_per_mtok_input: 0.10,
        cost_per_mtok_output: 0.40,
        max_output_tokens: 8192,
        context_window: 1_048_576,
        strengths: &[MetaTitle, MetaDescription, ContentSummary],
    },
    ModelSpec {
        id: "gemini-1.5-pro",
        provider: "gemini",
        quality: 8,
        speed: 5,
        cost_per_mtok_input: 1.25,
        cost_per_mtok_output: 5.00,
        max_output_tokens: 8192,
        context_window: 2_097_152,
        strengths: &[KeywordAnalysis, ContentSummary],
    },
];

const FLAGGED_WEIGHT: f64 = 3.0;
const BASE_WEIGHT: f64 = 1.0;
const STRENGTH_BONUS: f64 = 2.0;

/// Look up a model by exact id.
pub fn find_model(id: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.id == id)
}

/// Models the table lists for a provider, in table order.
pub fn models_for(provider: &str) -> impl Iterator<Item = &'static ModelSpec> + '_ {
    MODELS.iter().filter(move |m| m.provider == provider)
}

/// Pick the best model id for `task` within `provider` given `prefs`.
///
/// Score = w_q·quality + w_s·speed + w_c·(10 − cost_score) + task bonus, where
/// each weight is 3 when its flag is set and 1 otherwise, and `cost_score`
/// maps the blended price onto 0–10 against the priciest model in the table.
/// Falls back to the provider's default model when the table has no rows.
pub fn select_model(provider: &ProviderSpec, task: TaskType, prefs: &Preferences) -> &'static str {
    let max_price = MODELS
        .iter()
        .map(ModelSpec::blended_price)
        .fold(0.0_f64, f64::max);

    let weight = |flag: bool| if flag { FLAGGED_WEIGHT } else { BASE_WEIGHT };
    let (wq, ws, wc) = (weight(prefs.quality), weight(prefs.speed), weight(prefs.cost));

    let mut best: Option<(&'static ModelSpec, f64)> = None;
    for model in models_for(provider.name) {
        let cost_score = if max_price > 0.0 {
            model.blended_price() / max_price * 10.0
        } else {
            0.0
        };
        let bonus = if model.strengths.contains(&task) {
            STRENGTH_BONUS
        } else {
            0.0
        };
        let score = wq * f64::from(model.quality)
            + ws * f64::from(model.speed)
            + wc * (10.0 - cost_score)
            + bonus;

        // Strictly greater: ties keep the earlier row
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((model, score));
        }
    }

    best.map(|(m, _)| m.id).unwrap_or(provider.default_model)
}

/// Clamp a requested output budget to what the model (or provider) allows.
pub fn clamp_max_tokens(model: &str, provider: &ProviderSpec, requested: u32) -> u32 {
    let ceiling = find_model(model)
        .map(|m| m.max_output_tokens)
        .unwrap_or(provider.max_output_tokens);
    requested.min(ceiling)
}

/// Estimated USD cost of a call. Unknown models cost 0.0.
pub fn estimate_cost(model: &str, usage: &UsageInfo) -> f64 {
    find_model(model).map_or(0.0, |m| {
        (f64::from(usage.input_tokens) * m.cost_per_mtok_input
            + f64::from(usage.output_tokens) * m.cost_per_mtok_output)
            / 1_000_000.0
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
