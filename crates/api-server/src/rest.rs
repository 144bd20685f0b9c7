//! REST handlers for the recommendation endpoints. No decision logic
//! lives here: handlers validate input, call an agent, and serialize its
//! output.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use commerce_agents::{
    Aggregator, CollaborativeAgent, ContentAgent, ContextAgent, ContextRecommendation,
    MarketBasketAgent, RecommendationBundle,
};
use commerce_core::types::{FeatureTable, RecommendationItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Maximum string field length accepted at the API boundary.
const MAX_FIELD_LEN: usize = 256;

/// Maximum result count a single request may ask for.
const MAX_K: usize = 100;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<FeatureTable>,
    pub content: Arc<ContentAgent>,
    pub collaborative: Arc<CollaborativeAgent>,
    pub basket: Arc<MarketBasketAgent>,
    pub context: Arc<ContextAgent>,
    pub aggregator: Arc<Aggregator>,
    pub default_context_k: usize,
    pub start_time: Instant,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub table_rows: usize,
    pub uptime_secs: u64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn validate_request(request: &RecommendationRequest) -> Result<(), &'static str> {
    if request.user_id.is_empty() {
        return Err("'user_id' must not be empty");
    }
    if request.user_id.len() > MAX_FIELD_LEN {
        return Err("'user_id' exceeds maximum length");
    }
    if let Some(k) = request.k {
        if k == 0 || k > MAX_K {
            return Err("'k' must be between 1 and 100");
        }
    }
    Ok(())
}

fn bad_request(msg: &str) -> ApiError {
    metrics::counter!("api.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            message: msg.to_string(),
        }),
    )
}

/// POST /v1/recommendations/content
pub async fn content_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<Vec<RecommendationItem>>, ApiError> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Request validation failed");
        return Err(bad_request(msg));
    }
    let k = request.k.unwrap_or(commerce_agents::content::DEFAULT_K);
    Ok(Json(state.content.recommend(&request.user_id, k)))
}

/// POST /v1/recommendations/collaborative
pub async fn collaborative_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<Vec<RecommendationItem>>, ApiError> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Request validation failed");
        return Err(bad_request(msg));
    }
    let k = request.k.unwrap_or(commerce_agents::collaborative::DEFAULT_K);
    Ok(Json(state.collaborative.recommend(&request.user_id, k)))
}

/// POST /v1/recommendations/basket — resolves the user's order history,
/// then answers from the mined rule set.
pub async fn basket_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Request validation failed");
        return Err(bad_request(msg));
    }
    let history = state.content.order_history(&request.user_id);
    Ok(Json(state.basket.recommend(&history)))
}

/// POST /v1/recommendations/context
pub async fn context_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<ContextRecommendation>, ApiError> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Request validation failed");
        return Err(bad_request(msg));
    }
    let k = request.k.unwrap_or(state.default_context_k);
    Ok(Json(state.context.recommend(&request.user_id, k).await))
}

/// POST /v1/recommendations/all — every agent plus optional narration.
pub async fn all_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationBundle>, ApiError> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Request validation failed");
        return Err(bad_request(msg));
    }
    let k = request.k.unwrap_or(commerce_agents::content::DEFAULT_K);
    Ok(Json(state.aggregator.recommend(&request.user_id, k).await))
}

/// GET /v1/products/search?q= — case-insensitive substring match over
/// product titles.
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RecommendationItem>>, ApiError> {
    if query.q.is_empty() || query.q.len() > MAX_FIELD_LEN {
        return Err(bad_request("'q' must be between 1 and 256 characters"));
    }
    Ok(Json(search_by_title(&state.table, &query.q)))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        table_rows: state.table.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

fn search_by_title(table: &FeatureTable, needle: &str) -> Vec<RecommendationItem> {
    let needle = needle.to_lowercase();
    let mut seen = std::collections::HashSet::new();
    table
        .rows()
        .iter()
        .filter(|row| {
            row.title
                .as_deref()
                .map(|title| title.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .filter(|row| seen.insert(row.product_id.clone()))
        .map(RecommendationItem::from_line)
        .collect()
}
