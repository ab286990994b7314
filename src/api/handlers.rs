//! API request handlers
//!
//! Validates request bodies, dispatches to the embedding engine or the
//! entity extractor (never both; the two pipelines are independent),
//! and maps internal failures onto transport-level errors. Invalid
//! requests are rejected here and never reach the core components.

use crate::embeddings::EmbeddingError;
use crate::entities::{self, ExtractedEntity};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// Request/response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    /// Texts to embed (min 1 item)
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExtractEntitiesRequest {
    /// Text to extract entities from (min 1 char)
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractEntitiesResponse {
    pub entities: Vec<ExtractedEntity>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimension: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
///
/// Reports the identifier and dimension of the actually-loaded model.
/// In lazy mode this triggers the load; 503 when the model is unavailable.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let provider = state.engine.ensure_loaded().await.map_err(|e| {
        tracing::error!("Health check failed: {e}");
        AppError::from(e)
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        model: provider.model_name().to_string(),
        dimension: provider.dimensions(),
    }))
}

/// Generate embeddings for a batch of texts
pub async fn embed(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, AppError> {
    if request.texts.is_empty() {
        return Err(AppError::Validation(
            "texts must contain at least one item".to_string(),
        ));
    }

    let started = Instant::now();
    let embeddings = state.engine.embed_batch(&request.texts).await?;

    tracing::info!(
        count = embeddings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Generated embeddings"
    );

    Ok(Json(EmbedResponse {
        dimension: embeddings.first().map(|e| e.len()).unwrap_or(0),
        count: embeddings.len(),
        embeddings,
    }))
}

/// Extract entities from text
pub async fn extract_entities(
    Json(request): Json<ExtractEntitiesRequest>,
) -> Result<Json<ExtractEntitiesResponse>, AppError> {
    if request.text.is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let started = Instant::now();
    let entities = entities::extract(&request.text);

    tracing::info!(
        count = entities.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Extracted entities"
    );

    Ok(Json(ExtractEntitiesResponse {
        count: entities.len(),
        entities,
    }))
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Caller's fault: empty or malformed input (422, never retried)
    Validation(String),
    /// Embedding model failed to load (503, operator intervention)
    ModelUnavailable(String),
    /// Unexpected internal failure (500, caller retries the whole batch)
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::ModelUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
            EmbeddingError::Inference(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}
