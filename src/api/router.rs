use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;

/// Probes and the versioned API. `/metrics` is merged separately by `serve`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::domain::provider::ReasoningResult;
    use crate::domain::provider::mock::MockReasoningProvider;
    use crate::infrastructure::registry::InMemoryServiceRegistry;
    use crate::infrastructure::services::{QueryService, QueryServiceConfig};
    use crate::infrastructure::workflow::{
        InMemoryWorkflowStore, WorkflowEngine, WorkflowEngineConfig,
    };

    async fn app() -> Router {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        registry.set_reasoning_provider(Arc::new(
            MockReasoningProvider::new().with_answer(ReasoningResult::answer("The answer is 4.")),
        ));
        let engine = WorkflowEngine::build(
            registry,
            Arc::new(InMemoryWorkflowStore::new()),
            WorkflowEngineConfig::default(),
        )
        .await
        .unwrap();
        let service = QueryService::new(
            engine,
            QueryServiceConfig::default().with_poll_interval(Duration::from_millis(10)),
        );
        create_router(AppState::new(service))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app().await;

        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"].as_array().unwrap().len(), 3);

        let (status, _) = send(&app, get("/live")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_workflow_lifecycle() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post("/v1/workflows", json!({"input": {"content": "What is 2 + 2?"}})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "processing");
        assert_eq!(body["message"], "Workflow started");
        let id = body["workflow_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get(&format!("/v1/workflows/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workflow_id"], id.as_str());

        let mut result = (StatusCode::CONFLICT, Value::Null);
        for _ in 0..50 {
            result = send(&app, get(&format!("/v1/workflows/{}/result", id))).await;
            if result.0 != StatusCode::CONFLICT {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, body) = result;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["response"], "The answer is 4.");
        assert_eq!(body["steps"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_404() {
        let app = app().await;

        let (status, body) = send(
            &app,
            get("/v1/workflows/wf-00000000-0000-4000-8000-000000000000/result"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");

        let (status, _) = send(&app, get("/v1/workflows/garbage")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_query() {
        let app = app().await;

        let (status, body) = send(&app, post("/v1/queries", json!({"query": "2 + 2"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["response_text"], "The answer is 4.");
        assert!(body["response_id"].as_str().unwrap().starts_with("wf-"));
    }

    #[tokio::test]
    async fn test_invalid_query_bodies() {
        let app = app().await;

        let (status, _) = send(&app, post("/v1/queries", json!({"query": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, post("/v1/queries", json!({"text": "2 + 2"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "invalid_json");
    }

    #[tokio::test]
    async fn test_analyze_without_analysis_response() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post("/v1/queries/analyze", json!({"query": "integrate x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["query"], "integrate x");
    }
}
