//! Application State

use std::sync::Arc;

use tokio::sync::RwLock;

use assistant_core::{GenerationProvider, TokenRegistry};

use crate::pipeline::AnalysisPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Token alias table; write lock only taken by registration
    pub registry: Arc<RwLock<TokenRegistry>>,

    /// Query-to-analysis pipeline
    pub pipeline: Arc<AnalysisPipeline>,

    /// Generation backend (Ollama, etc.)
    pub provider: Arc<dyn GenerationProvider>,

    /// Whether a news API key was configured at startup
    pub news_api_configured: bool,
}
