//! Query service - synchronous facade over the workflow engine

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::domain::pipeline::{ContextEntity, EntityType};
use crate::domain::provider::{ANALYSIS_PROMPT, QueryAnalysis, RequestMeta};
use crate::domain::registry::REASONING_PROVIDER_ID;
use crate::domain::workflow::{DEGRADED_RESPONSE, Workflow, WorkflowId, WorkflowInput, WorkflowState};
use crate::domain::DomainError;
use crate::infrastructure::workflow::WorkflowEngine;

pub const ERROR_RESPONSE: &str = "I'm sorry, an error occurred while processing your request.";
pub const TIMEOUT_RESPONSE: &str =
    "I'm sorry, the processing of your request took too long and timed out.";
pub const INCOMPLETE_RESPONSE: &str =
    "I'm sorry, I couldn't complete the processing of your request.";
pub const ANALYSIS_FAILURE_RESPONSE: &str = "I'm sorry, I couldn't analyze your query.";

/// Polling behaviour of the facade
#[derive(Debug, Clone)]
pub struct QueryServiceConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    /// Cancel workflows abandoned on timeout
    pub cancel_on_timeout: bool,
}

impl Default for QueryServiceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(30),
            cancel_on_timeout: true,
        }
    }
}

impl QueryServiceConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_cancel_on_timeout(mut self, cancel: bool) -> Self {
        self.cancel_on_timeout = cancel;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Which optional parts of an answer to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePreferences {
    #[serde(default = "default_true")]
    pub include_steps: bool,
    #[serde(default = "default_true")]
    pub include_visualization: bool,
    #[serde(default = "default_true")]
    pub include_additional_context: bool,
}

impl Default for ResponsePreferences {
    fn default() -> Self {
        Self {
            include_steps: true,
            include_visualization: true,
            include_additional_context: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub preferences: ResponsePreferences,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            preferences: ResponsePreferences::default(),
            context_id: None,
            conversation_id: None,
        }
    }

    pub fn with_preferences(mut self, preferences: ResponsePreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }
}

/// Why a query produced no answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFailure {
    StartFailed,
    WorkflowError,
    Incomplete,
    TimedOut,
}

impl QueryFailure {
    fn response(&self) -> &'static str {
        match self {
            Self::StartFailed => DEGRADED_RESPONSE,
            Self::WorkflowError => ERROR_RESPONSE,
            Self::Incomplete => INCOMPLETE_RESPONSE,
            Self::TimedOut => TIMEOUT_RESPONSE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latex_expressions: Vec<String>,
    /// Seconds, rounded to two decimals
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryFailure>,
}

impl QueryResponse {
    fn failure(response_id: Option<&WorkflowId>, failure: QueryFailure, elapsed: Duration) -> Self {
        Self {
            success: false,
            response_id: response_id.map(ToString::to_string),
            response_text: failure.response().to_string(),
            latex_expressions: Vec::new(),
            execution_time: round_secs(elapsed),
            steps: None,
            visualization_urls: None,
            additional_context: None,
            error: Some(failure),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub query: String,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context_id: None,
            conversation_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<QueryAnalysis>,
    pub execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Submits queries to the engine and waits for their answers
#[derive(Debug, Clone)]
pub struct QueryService {
    engine: WorkflowEngine,
    config: QueryServiceConfig,
}

impl QueryService {
    pub fn new(engine: WorkflowEngine, config: QueryServiceConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn config(&self) -> &QueryServiceConfig {
        &self.config
    }

    /// Start a workflow for the query and poll until it finishes or
    /// `max_wait` elapses
    #[instrument(skip(self, request), fields(conversation_id = ?request.conversation_id))]
    pub async fn submit_and_await(&self, request: QueryRequest) -> QueryResponse {
        let started = Instant::now();
        let input = WorkflowInput::raw(request.query, "text/plain");

        let handle = match self
            .engine
            .start_workflow(input, request.context_id, request.conversation_id)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "Failed to start workflow");
                return QueryResponse::failure(None, QueryFailure::StartFailed, started.elapsed());
            }
        };

        let id = handle.id().clone();
        let cancel = handle.cancellation_token();

        loop {
            let workflow = match self.engine.snapshot(&id).await {
                Ok(workflow) => workflow,
                Err(e) => {
                    error!(workflow_id = %id, error = %e, "Workflow disappeared while waiting");
                    return QueryResponse::failure(
                        Some(&id),
                        QueryFailure::Incomplete,
                        started.elapsed(),
                    );
                }
            };

            match workflow.state() {
                WorkflowState::Completed => {
                    return self.completed(&workflow, request.preferences, started.elapsed());
                }
                WorkflowState::Error => {
                    error!(workflow_id = %id, error = ?workflow.error(), "Workflow failed");
                    return QueryResponse::failure(
                        Some(&id),
                        QueryFailure::WorkflowError,
                        started.elapsed(),
                    );
                }
                WorkflowState::Initializing | WorkflowState::Processing => {}
            }

            if started.elapsed() >= self.config.max_wait {
                warn!(
                    workflow_id = %id,
                    max_wait_ms = self.config.max_wait.as_millis() as u64,
                    cancel = self.config.cancel_on_timeout,
                    "Timed out waiting for workflow"
                );
                if self.config.cancel_on_timeout {
                    cancel.cancel();
                }
                return QueryResponse::failure(Some(&id), QueryFailure::TimedOut, started.elapsed());
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn completed(
        &self,
        workflow: &Workflow,
        preferences: ResponsePreferences,
        elapsed: Duration,
    ) -> QueryResponse {
        let Some(answer) = workflow.result() else {
            warn!(workflow_id = %workflow.id(), "Completed workflow has no result");
            return QueryResponse::failure(Some(workflow.id()), QueryFailure::Incomplete, elapsed);
        };

        info!(
            workflow_id = %workflow.id(),
            success = answer.success,
            elapsed_ms = elapsed.as_millis() as u64,
            "Query answered"
        );

        QueryResponse {
            success: answer.success,
            response_id: Some(workflow.id().to_string()),
            response_text: answer.response.clone(),
            latex_expressions: answer.latex_expressions.clone(),
            execution_time: round_secs(elapsed),
            steps: preferences.include_steps.then(|| answer.steps.clone()),
            visualization_urls: preferences
                .include_visualization
                .then(|| answer.visualization_urls())
                .filter(|urls| !urls.is_empty()),
            additional_context: preferences
                .include_additional_context
                .then(|| answer.additional_context.clone())
                .flatten(),
            error: None,
        }
    }

    /// Ask the reasoning provider for a structured analysis of the query
    #[instrument(skip(self, request), fields(conversation_id = ?request.conversation_id))]
    pub async fn analyze_query(&self, request: AnalysisRequest) -> AnalysisResponse {
        let started = Instant::now();

        match self.analyze(&request).await {
            Ok(analysis) => {
                info!(
                    complexity = ?analysis.complexity,
                    operations = analysis.operations.len(),
                    "Query analyzed"
                );
                AnalysisResponse {
                    success: true,
                    query: request.query,
                    analysis: Some(analysis),
                    execution_time: round_secs(started.elapsed()),
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Query analysis failed");
                AnalysisResponse {
                    success: false,
                    query: request.query,
                    analysis: None,
                    execution_time: round_secs(started.elapsed()),
                    error: Some(ANALYSIS_FAILURE_RESPONSE.to_string()),
                }
            }
        }
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<QueryAnalysis, DomainError> {
        let context_id = self
            .engine
            .ensure_context(request.context_id.clone(), request.conversation_id.clone())
            .await;

        let provider = self
            .engine
            .reasoning_provider()
            .await
            .ok_or_else(|| DomainError::provider_unavailable(REASONING_PROVIDER_ID))?;

        let input = self
            .engine
            .input_normalizer()
            .process(&request.query, "text/plain")
            .await?;

        let meta = RequestMeta::analysis(&context_id, request.conversation_id.clone());
        let result = provider.analyze(&input, ANALYSIS_PROMPT, &meta).await?;
        if !result.success {
            let message = result
                .error
                .clone()
                .unwrap_or_else(|| "analysis reported failure".to_string());
            return Err(DomainError::provider(REASONING_PROVIDER_ID, message));
        }

        let mut analysis = QueryAnalysis::from_reasoning(&result);
        match self.engine.content_router().route(&input).await {
            Ok(decision) => analysis = analysis.with_routing(&decision),
            Err(e) => warn!(error = %e, "Routing failed during analysis"),
        }

        self.store_analysis(&context_id, &analysis).await;
        Ok(analysis)
    }

    async fn store_analysis(&self, context_id: &str, analysis: &QueryAnalysis) {
        let content = match serde_json::to_value(analysis) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Could not serialize analysis");
                return;
            }
        };

        let entity = ContextEntity::new(EntityType::QueryAnalysis, content);
        if let Err(e) = self
            .engine
            .context_store()
            .add_entity(context_id, entity, "analysis")
            .await
        {
            warn!(context_id, error = %e, "Failed to store analysis in context");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::domain::pipeline::MockInputNormalizer;
    use crate::domain::provider::mock::{MockReasoningProvider, MockVisualizationProvider};
    use crate::domain::provider::{
        Complexity, ReasoningResult, RenderedVisualization, VisualizationIntent,
    };
    use crate::infrastructure::registry::InMemoryServiceRegistry;
    use crate::infrastructure::workflow::{InMemoryWorkflowStore, WorkflowEngineConfig};

    async fn service_with(
        registry: Arc<InMemoryServiceRegistry>,
        config: QueryServiceConfig,
    ) -> QueryService {
        let engine = WorkflowEngine::build(
            registry,
            Arc::new(InMemoryWorkflowStore::new()),
            WorkflowEngineConfig::default(),
        )
        .await
        .unwrap();
        QueryService::new(engine, config)
    }

    fn fast_polling() -> QueryServiceConfig {
        QueryServiceConfig::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_max_wait(Duration::from_secs(5))
    }

    fn plotting_registry() -> Arc<InMemoryServiceRegistry> {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        registry.set_reasoning_provider(Arc::new(
            MockReasoningProvider::new().with_answer(
                ReasoningResult::answer("Here is the parabola.")
                    .with_steps(vec![json!({"step": "sample points"})])
                    .with_latex(vec!["y = x^2".to_string()]),
            ),
        ));
        registry.set_visualization_provider(Arc::new(
            MockVisualizationProvider::new()
                .with_intent(VisualizationIntent::request("function_2d", 0.8))
                .with_render(RenderedVisualization::rendered("/tmp/p.png", "http://viz/p.png")),
        ));
        registry
    }

    #[test]
    fn test_config_defaults() {
        let config = QueryServiceConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.max_wait, Duration::from_secs(30));
        assert!(config.cancel_on_timeout);
    }

    #[test]
    fn test_request_preferences_default_to_true() {
        let request: QueryRequest = serde_json::from_value(json!({"query": "2+2"})).unwrap();
        assert_eq!(request.preferences, ResponsePreferences::default());

        let request: QueryRequest = serde_json::from_value(json!({
            "query": "2+2",
            "preferences": {"include_steps": false}
        }))
        .unwrap();
        assert!(!request.preferences.include_steps);
        assert!(request.preferences.include_visualization);
    }

    #[test]
    fn test_round_secs() {
        assert_eq!(round_secs(Duration::from_millis(1234)), 1.23);
        assert_eq!(round_secs(Duration::from_millis(1236)), 1.24);
    }

    #[tokio::test]
    async fn test_submit_and_await_completed() {
        let service = service_with(plotting_registry(), fast_polling()).await;

        let response = service
            .submit_and_await(QueryRequest::new("plot y = x^2"))
            .await;

        assert!(response.success);
        assert!(response.response_id.unwrap().starts_with("wf-"));
        assert!(response.response_text.starts_with("Here is the parabola."));
        assert_eq!(response.latex_expressions, vec!["y = x^2"]);
        assert_eq!(response.steps.unwrap().len(), 1);
        assert_eq!(response.visualization_urls.unwrap(), vec!["http://viz/p.png"]);
        assert!(response.error.is_none());
        assert!(response.execution_time >= 0.0);
    }

    #[tokio::test]
    async fn test_preferences_filter_response() {
        let service = service_with(plotting_registry(), fast_polling()).await;

        let response = service
            .submit_and_await(QueryRequest::new("plot y = x^2").with_preferences(
                ResponsePreferences {
                    include_steps: false,
                    include_visualization: false,
                    include_additional_context: false,
                },
            ))
            .await;

        assert!(response.success);
        assert!(response.steps.is_none());
        assert!(response.visualization_urls.is_none());
        assert!(response.additional_context.is_none());
    }

    #[tokio::test]
    async fn test_degraded_answer_is_returned() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        let service = service_with(registry, fast_polling()).await;

        let response = service.submit_and_await(QueryRequest::new("2+2")).await;
        assert!(!response.success);
        assert_eq!(response.response_text, DEGRADED_RESPONSE);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_workflow_error_returns_apology() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        let mut normalizer = MockInputNormalizer::new();
        normalizer
            .expect_process()
            .returning(|_, _| Err(DomainError::invalid_input("content is empty")));
        registry.set_input_normalizer(Arc::new(normalizer));
        let service = service_with(registry, fast_polling()).await;

        let response = service.submit_and_await(QueryRequest::new("")).await;
        assert!(!response.success);
        assert_eq!(response.error, Some(QueryFailure::WorkflowError));
        assert_eq!(response.response_text, ERROR_RESPONSE);
        assert!(!response.response_text.contains("content is empty"));
    }

    #[tokio::test]
    async fn test_timeout_cancels_workflow() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        registry.set_reasoning_provider(Arc::new(
            MockReasoningProvider::new()
                .with_answer(ReasoningResult::answer("late"))
                .with_delay(Duration::from_secs(5)),
        ));
        let config = QueryServiceConfig::default()
            .with_poll_interval(Duration::from_millis(20))
            .with_max_wait(Duration::from_millis(200));
        let service = service_with(registry, config).await;

        let started = Instant::now();
        let response = service.submit_and_await(QueryRequest::new("slow")).await;
        let waited = started.elapsed();

        assert_eq!(response.error, Some(QueryFailure::TimedOut));
        assert_eq!(response.response_text, TIMEOUT_RESPONSE);
        assert!(waited >= Duration::from_millis(200));
        assert!(waited < Duration::from_secs(2));

        let id = WorkflowId::new(response.response_id.unwrap()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let workflow = service.engine().snapshot(&id).await.unwrap();
        assert_eq!(workflow.state(), WorkflowState::Error);
    }

    #[tokio::test]
    async fn test_timeout_without_cancellation_leaves_workflow_running() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        registry.set_reasoning_provider(Arc::new(
            MockReasoningProvider::new()
                .with_answer(ReasoningResult::answer("late"))
                .with_delay(Duration::from_secs(5)),
        ));
        let config = QueryServiceConfig::default()
            .with_poll_interval(Duration::from_millis(20))
            .with_max_wait(Duration::from_millis(100))
            .with_cancel_on_timeout(false);
        let service = service_with(registry, config).await;

        let response = service.submit_and_await(QueryRequest::new("slow")).await;
        assert_eq!(response.error, Some(QueryFailure::TimedOut));

        let id = WorkflowId::new(response.response_id.unwrap()).unwrap();
        let workflow = service.engine().snapshot(&id).await.unwrap();
        assert_eq!(workflow.state(), WorkflowState::Processing);
    }

    #[tokio::test]
    async fn test_analyze_query_from_fenced_json() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        registry.set_reasoning_provider(Arc::new(MockReasoningProvider::new().with_analysis(
            ReasoningResult::answer(
                "Here you go:\n```json\n{\"operations\": [\"integration\"], \"concepts\": [\"calculus\"], \"complexity\": \"moderate\"}\n```",
            ),
        )));
        let service = service_with(registry, fast_polling()).await;
        let contexts = service.engine().context_store();
        let context_id = contexts.create_context(None).await.unwrap();

        let mut request = AnalysisRequest::new("integrate sin(x) from 0 to pi");
        request.context_id = Some(context_id.clone());
        let response = service.analyze_query(request).await;

        assert!(response.success);
        let analysis = response.analysis.unwrap();
        assert_eq!(analysis.operations, vec!["integration"]);
        assert_eq!(analysis.complexity, Complexity::Moderate);
        assert!(analysis.routing.is_some());

        let context = contexts.get_context(&context_id).await.unwrap().unwrap();
        assert_eq!(context.entities.len(), 1);
        assert_eq!(context.entities[0].kind, "analysis");
        assert_eq!(context.entities[0].entity.entity_type, EntityType::QueryAnalysis);
    }

    #[tokio::test]
    async fn test_analyze_query_without_reasoning_provider() {
        let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
        let service = service_with(registry, fast_polling()).await;

        let response = service
            .analyze_query(AnalysisRequest::new("what is a group?"))
            .await;
        assert!(!response.success);
        assert!(response.analysis.is_none());
        assert_eq!(response.error.as_deref(), Some(ANALYSIS_FAILURE_RESPONSE));
    }
}
