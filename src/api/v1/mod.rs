//! v1 API endpoints

pub mod queries;
pub mod workflows;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/workflows", post(workflows::start_workflow))
        .route("/workflows/{id}", get(workflows::get_workflow_status))
        .route("/workflows/{id}/result", get(workflows::get_workflow_result))
        .route("/queries", post(queries::submit_query))
        .route("/queries/analyze", post(queries::analyze_query))
}
