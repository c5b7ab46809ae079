//! Crypto Analysis Assistant Server
//!
//! Axum-based server that turns free-text queries ("tell me about
//! ethereum") into localized market analyses backed by Binance,
//! CoinGecko, CryptoPanic, and a local Ollama instance.

mod handlers;
mod pipeline;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assistant_core::{GenerationProvider, TokenRegistry};
use assistant_data::{CryptoPanicApi, MarketDataClient, NewsClient, PostsApi};
use assistant_runtime::{OllamaClient, OllamaConfig};

use crate::handlers::{analyze, health_check, list_models, list_tokens, register_token};
use crate::pipeline::AnalysisPipeline;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize generation backend
    let config = OllamaConfig::from_env();
    let default_model = config.model.clone();
    let provider: Arc<dyn GenerationProvider> = Arc::new(OllamaClient::from_config(config));

    // Verify Ollama connection
    if provider.health_check().await {
        tracing::info!("✓ Connected to Ollama");
        for model in provider.list_models().await {
            tracing::info!("  Model: {}", model);
        }
    } else {
        tracing::warn!("⚠ Ollama not available - analyses will degrade to diagnostics");
        tracing::warn!("  Make sure Ollama is running: ollama serve");
    }

    // Token registry with the default seed table
    let registry = TokenRegistry::with_defaults();
    tracing::info!("Loaded {} tokens", registry.token_count());
    let registry = Arc::new(RwLock::new(registry));

    // Market data tiers: Binance primary, CoinGecko fallback
    let market = Arc::new(MarketDataClient::new());

    // News feed
    let news_api = CryptoPanicApi::from_env();
    let news_api_configured = news_api.has_key();
    if news_api_configured {
        tracing::info!("✓ CryptoPanic API key configured");
    } else {
        tracing::warn!("⚠ No news API key - only the public feed will be queried");
        tracing::warn!("  Set CRYPTOPANIC_API_KEY in .env for full coverage");
    }
    let news = Arc::new(NewsClient::new(Arc::new(news_api)));

    // Build application state
    let pipeline = Arc::new(AnalysisPipeline::new(
        registry.clone(),
        market,
        news,
        provider.clone(),
        default_model,
    ));
    let state = AppState {
        registry,
        pipeline,
        provider,
        news_api_configured,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))

        // Analysis API
        .route("/api/analyze", post(analyze))
        .route("/api/tokens", get(list_tokens).post(register_token))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto analysis assistant running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       - Health check");
    tracing::info!("  GET  /api/models   - List installed models");
    tracing::info!("  POST /api/analyze  - Analyze a token from free text");
    tracing::info!("  GET  /api/tokens   - List supported tokens");
    tracing::info!("  POST /api/tokens   - Register a custom token");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
