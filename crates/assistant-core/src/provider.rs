//! Generation Provider Strategy Pattern
//!
//! Implement this for each generation backend: Ollama, a hosted API, a
//! canned test double, etc. The pipeline only ever talks to the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::prompt::Language;

fn default_temperature() -> f32 {
    0.7
}

fn default_num_predict() -> u32 {
    500
}

fn default_top_p() -> f32 {
    0.9
}

/// Sampling parameters forwarded to the generation backend
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SamplingOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            top_p: default_top_p(),
        }
    }
}

/// Text generation backend
///
/// `generate` must not fail: when the backend is unreachable or returns
/// nothing usable, implementations degrade to a human-readable
/// diagnostic in the requested language instead of an error.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce analysis text for an assembled prompt
    async fn generate(&self, prompt: &str, model: &str, language: Language) -> String;

    /// Whether the backend is currently reachable
    async fn health_check(&self) -> bool;

    /// Models the backend reports as installed; empty when unreachable
    async fn list_models(&self) -> Vec<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
