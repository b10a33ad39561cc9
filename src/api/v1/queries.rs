//! Synchronous query endpoints

use axum::{extract::State, response::IntoResponse};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::services::{AnalysisRequest, QueryRequest};

/// POST /v1/queries - answer a query, waiting for the workflow to finish
pub async fn submit_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    Ok(Json(state.query_service.submit_and_await(request).await))
}

/// POST /v1/queries/analyze
pub async fn analyze_query(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    Ok(Json(state.query_service.analyze_query(request).await))
}
