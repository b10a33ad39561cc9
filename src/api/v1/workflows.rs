//! Workflow endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, StartWorkflowRequest, WorkflowIdPath};

/// POST /v1/workflows - start a workflow and return immediately
pub async fn start_workflow(
    State(state): State<AppState>,
    Json(request): Json<StartWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state
        .engine
        .start_workflow(request.input, request.context_id, request.conversation_id)
        .await?;

    debug!(workflow_id = %handle.id(), "Workflow accepted");
    Ok((StatusCode::ACCEPTED, Json(handle.started().clone())))
}

/// GET /v1/workflows/{id}
pub async fn get_workflow_status(
    State(state): State<AppState>,
    Path(path): Path<WorkflowIdPath>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path.parse()?;
    let status = state.engine.status(&id).await?;
    Ok(Json(status))
}

/// GET /v1/workflows/{id}/result - 409 until the workflow has completed
pub async fn get_workflow_result(
    State(state): State<AppState>,
    Path(path): Path<WorkflowIdPath>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path.parse()?;
    let outcome = state.engine.result(&id).await?;
    Ok(Json(outcome))
}
