//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use assistant_core::{
    AssistantError, Depth, Language, MarketSnapshot, NewsItem, PriceSnapshot, TokenIdentity,
};

use crate::pipeline::AnalysisOptions;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ollama_connected: bool,
    pub news_api_configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub query: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub news_limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub request_id: String,
    pub token: TokenIdentity,
    pub price: PriceSnapshot,
    pub market: MarketSnapshot,
    pub news: Vec<NewsItem>,
    pub summary: String,
    pub model: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTokenRequest {
    pub name: String,
    pub symbol: String,
    pub provider_id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Serialize)]
pub struct TokensResponse {
    pub tokens: Vec<String>,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ollama_connected = state.provider.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ollama_connected,
        news_api_configured: state.news_api_configured,
    })
}

/// Main analysis endpoint
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query must not be empty".into(),
                code: "EMPTY_QUERY".into(),
                suggestions: Vec::new(),
            }),
        ));
    }

    let options = AnalysisOptions {
        language: payload.language,
        depth: payload.depth,
        model: payload.model,
        news_limit: payload.news_limit,
    };

    let report = state
        .pipeline
        .analyze(&payload.query, options)
        .await
        .map_err(|e| match e {
            AssistantError::UnknownToken { ref query, ref suggestions } => {
                tracing::info!(query = %query, "no token resolved");
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: e.user_message(),
                        code: "UNKNOWN_TOKEN".into(),
                        suggestions: suggestions.clone(),
                    }),
                )
            }
            other => {
                tracing::error!("Analysis error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: other.user_message(),
                        code: "ANALYSIS_ERROR".into(),
                        suggestions: Vec::new(),
                    }),
                )
            }
        })?;

    Ok(Json(AnalyzeResponse {
        request_id: uuid::Uuid::new_v4().to_string(),
        token: report.token,
        price: report.price,
        market: report.market,
        news: report.news,
        summary: report.summary,
        model: report.model,
        elapsed_ms: report.elapsed_ms,
    }))
}

/// List models installed on the generation backend
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.provider.list_models().await,
    })
}

/// List supported tokens as "Name (SYMBOL)" labels
pub async fn list_tokens(State(state): State<AppState>) -> Json<TokensResponse> {
    let registry = state.registry.read().await;
    Json(TokensResponse {
        tokens: registry.supported(),
    })
}

/// Register a custom token at runtime
pub async fn register_token(
    State(state): State<AppState>,
    Json(payload): Json<RegisterTokenRequest>,
) -> Result<(StatusCode, Json<TokenIdentity>), (StatusCode, Json<ErrorResponse>)> {
    let identity = TokenIdentity::new(payload.name, payload.symbol, payload.provider_id)
        .with_aliases(payload.aliases);

    let mut registry = state.registry.write().await;
    match registry.register(identity) {
        Ok(registered) => {
            tracing::info!(token = %registered.symbol, "token registered");
            Ok((StatusCode::CREATED, Json(registered)))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INVALID_TOKEN".into(),
                suggestions: Vec::new(),
            }),
        )),
    }
}
