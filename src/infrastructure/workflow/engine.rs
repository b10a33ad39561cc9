//! Workflow engine
//!
//! Runs the orchestration pipeline for one workflow per spawned task:
//!
//! 1. input normalization
//! 2. ambiguity check
//! 3. content routing
//! 4. provider dispatch
//! 5. visualization check
//! 6. conditional computation
//! 7. response assembly
//! 8. context persistence
//! 9. finalization
//!
//! Provider absence or failure degrades the answer instead of failing the
//! workflow. Only input normalization errors, cancellation and panics move a
//! workflow to `error`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::provider_cache::ProviderCache;
use super::step_tracker::StepTracker;
use crate::domain::pipeline::{
    ContentRouter, ContextEntity, ContextStore, EntityType, InputNormalizer, RelationKind,
    RoutingDecision, TypedInput,
};
use crate::domain::provider::{
    ComputationProvider, ComputationRequest, ComputationResult, ReasoningProvider, RequestMeta,
    Visualization, VisualizationProvider,
};
use crate::domain::registry::ServiceRegistry;
use crate::domain::workflow::{
    ComputationOutcome, DegradedResult, DispatchOutcome, FinalAnswer, Stage, VisualizationEntry,
    VisualizationSource, Workflow, WorkflowError, WorkflowId, WorkflowInput, WorkflowOutcome,
    WorkflowStarted, WorkflowStatus, WorkflowStore,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_degradation, record_workflow_finished, record_workflow_started,
};

/// Thresholds applied by the pipeline
#[derive(Debug, Clone)]
pub struct WorkflowEngineConfig {
    /// Routing decisions below this confidence fall back to the reasoning provider
    pub min_routing_confidence: f64,
    /// Visualization intents below this confidence are not rendered
    pub min_visualization_confidence: f64,
}

impl Default for WorkflowEngineConfig {
    fn default() -> Self {
        Self {
            min_routing_confidence: 0.0,
            min_visualization_confidence: 0.5,
        }
    }
}

/// Provider availability as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderAvailability {
    pub reasoning: bool,
    pub computation: bool,
    pub visualization: bool,
}

impl ProviderAvailability {
    pub fn all_available(&self) -> bool {
        self.reasoning && self.computation && self.visualization
    }
}

/// Handle to a spawned workflow run. Await it or poll the engine; dropping it
/// leaves the run going.
#[derive(Debug)]
pub struct WorkflowHandle {
    id: WorkflowId,
    started: WorkflowStarted,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl WorkflowHandle {
    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn started(&self) -> &WorkflowStarted {
        &self.started
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the run at its next suspension point; the workflow ends in `error`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the terminal state has been committed
    pub async fn wait(self) -> Result<(), WorkflowError> {
        self.task
            .await
            .map_err(|e| WorkflowError::engine(format!("workflow task failed: {}", e)))
    }
}

/// Orchestration engine. Cheap to clone.
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: Arc<dyn ServiceRegistry>,
    store: Arc<dyn WorkflowStore>,
    tracker: StepTracker,
    normalizer: Arc<dyn InputNormalizer>,
    router: Arc<dyn ContentRouter>,
    contexts: Arc<dyn ContextStore>,
    reasoning: ProviderCache<dyn ReasoningProvider>,
    computation: ProviderCache<dyn ComputationProvider>,
    visualization: ProviderCache<dyn VisualizationProvider>,
    config: WorkflowEngineConfig,
}

/// Providers used by one run. A provider that resolved once serves the rest
/// of the run even if the registry changes; an absent one is looked up again
/// on its next use.
#[derive(Default)]
struct RunProviders {
    reasoning: Option<Arc<dyn ReasoningProvider>>,
    computation: Option<Arc<dyn ComputationProvider>>,
    visualization: Option<Arc<dyn VisualizationProvider>>,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Resolve required collaborators and warm the provider caches.
    ///
    /// Missing collaborators are fatal. Missing providers are not: they are
    /// resolved again when a workflow needs them.
    pub async fn build(
        registry: Arc<dyn ServiceRegistry>,
        store: Arc<dyn WorkflowStore>,
        config: WorkflowEngineConfig,
    ) -> Result<Self, WorkflowError> {
        let required = |e: DomainError| WorkflowError::engine(format!("required service missing: {}", e));

        let normalizer = registry.input_normalizer().map_err(required)?;
        let router = registry.content_router().map_err(required)?;
        let contexts = registry.context_store().map_err(required)?;

        let engine = Self {
            inner: Arc::new(EngineInner {
                registry,
                tracker: StepTracker::new(store.clone()),
                store,
                normalizer,
                router,
                contexts,
                reasoning: ProviderCache::new(),
                computation: ProviderCache::new(),
                visualization: ProviderCache::new(),
                config,
            }),
        };

        let availability = engine.provider_availability().await;
        info!(
            reasoning = availability.reasoning,
            computation = availability.computation,
            visualization = availability.visualization,
            "Workflow engine initialized"
        );

        Ok(engine)
    }

    pub fn config(&self) -> &WorkflowEngineConfig {
        &self.inner.config
    }

    pub fn input_normalizer(&self) -> Arc<dyn InputNormalizer> {
        self.inner.normalizer.clone()
    }

    pub fn content_router(&self) -> Arc<dyn ContentRouter> {
        self.inner.router.clone()
    }

    pub fn context_store(&self) -> Arc<dyn ContextStore> {
        self.inner.contexts.clone()
    }

    /// Cached reasoning provider, resolved on demand
    pub async fn reasoning_provider(&self) -> Option<Arc<dyn ReasoningProvider>> {
        self.inner.reasoning_provider().await
    }

    pub async fn provider_availability(&self) -> ProviderAvailability {
        ProviderAvailability {
            reasoning: self.inner.reasoning_provider().await.is_some(),
            computation: self.inner.computation_provider().await.is_some(),
            visualization: self.inner.visualization_provider().await.is_some(),
        }
    }

    /// Return the given context id, or create a context for the conversation.
    /// When the context store fails a detached id is generated.
    pub async fn ensure_context(
        &self,
        context_id: Option<String>,
        conversation_id: Option<String>,
    ) -> String {
        if let Some(id) = context_id {
            return id;
        }

        match self.inner.contexts.create_context(conversation_id).await {
            Ok(id) => id,
            Err(e) => {
                let id = format!("ctx-{}", uuid::Uuid::new_v4());
                warn!(error = %e, context_id = %id, "Context creation failed, using detached context id");
                id
            }
        }
    }

    /// Create a workflow and spawn its run
    #[instrument(skip(self, input))]
    pub async fn start_workflow(
        &self,
        input: WorkflowInput,
        context_id: Option<String>,
        conversation_id: Option<String>,
    ) -> Result<WorkflowHandle, WorkflowError> {
        let context_id = self
            .ensure_context(context_id, conversation_id.clone())
            .await;

        let mut workflow = Workflow::new(input, context_id, conversation_id);
        workflow.mark_processing()?;

        let id = workflow.id().clone();
        let started = WorkflowStarted::from(&workflow);
        self.inner.store.create(workflow).await?;

        record_workflow_started();
        info!(workflow_id = %id, context_id = %started.context_id, "Workflow started");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.inner.clone().run(id.clone(), cancel.clone()));

        Ok(WorkflowHandle {
            id,
            started,
            task,
            cancel,
        })
    }

    pub async fn snapshot(&self, id: &WorkflowId) -> Result<Workflow, WorkflowError> {
        self.inner
            .store
            .get(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(id.as_str()))
    }

    pub async fn status(&self, id: &WorkflowId) -> Result<WorkflowStatus, WorkflowError> {
        let workflow = self.snapshot(id).await?;
        Ok(WorkflowStatus::from(&workflow))
    }

    /// Result of a completed workflow; `NotCompleted` while running or failed
    pub async fn result(&self, id: &WorkflowId) -> Result<WorkflowOutcome, WorkflowError> {
        let workflow = self.snapshot(id).await?;
        WorkflowOutcome::try_from(&workflow)
    }
}

impl EngineInner {
    async fn reasoning_provider(&self) -> Option<Arc<dyn ReasoningProvider>> {
        self.reasoning
            .get_or_resolve(self.registry.revision(), || {
                self.registry.reasoning_provider()
            })
            .await
    }

    async fn computation_provider(&self) -> Option<Arc<dyn ComputationProvider>> {
        self.computation
            .get_or_resolve(self.registry.revision(), || {
                self.registry.computation_provider()
            })
            .await
    }

    async fn visualization_provider(&self) -> Option<Arc<dyn VisualizationProvider>> {
        self.visualization
            .get_or_resolve(self.registry.revision(), || {
                self.registry.visualization_provider()
            })
            .await
    }

    async fn run_reasoning(&self, run: &mut RunProviders) -> Option<Arc<dyn ReasoningProvider>> {
        if run.reasoning.is_none() {
            run.reasoning = self.reasoning_provider().await;
        }
        run.reasoning.clone()
    }

    async fn run_computation(
        &self,
        run: &mut RunProviders,
    ) -> Option<Arc<dyn ComputationProvider>> {
        if run.computation.is_none() {
            run.computation = self.computation_provider().await;
        }
        run.computation.clone()
    }

    async fn run_visualization(
        &self,
        run: &mut RunProviders,
    ) -> Option<Arc<dyn VisualizationProvider>> {
        if run.visualization.is_none() {
            run.visualization = self.visualization_provider().await;
        }
        run.visualization.clone()
    }

    async fn run(self: Arc<Self>, id: WorkflowId, cancel: CancellationToken) {
        let started = Instant::now();
        let pipeline = AssertUnwindSafe(self.execute(&id)).catch_unwind();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WorkflowError::Cancelled.to_string()),
            result = pipeline => match result {
                Ok(Ok(answer)) => Ok(answer),
                Ok(Err(e)) => Err(e.to_string()),
                Err(panic) => Err(format!("pipeline panicked: {}", panic_message(panic.as_ref()))),
            },
        };

        let committed = match outcome {
            Ok(answer) => {
                self.store
                    .mutate(&id, Box::new(move |w: &mut Workflow| w.mark_completed(answer)))
                    .await
            }
            Err(message) => {
                error!(workflow_id = %id, error = %message, "Workflow failed");
                self.store
                    .mutate(&id, Box::new(move |w: &mut Workflow| w.mark_failed(message)))
                    .await
            }
        };

        match committed {
            Ok(workflow) => {
                record_workflow_finished(workflow.state(), started.elapsed());
                info!(
                    workflow_id = %id,
                    state = %workflow.state(),
                    steps = workflow.current_step(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Workflow finished"
                );
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "Could not commit terminal state");
            }
        }
    }

    async fn execute(&self, id: &WorkflowId) -> Result<FinalAnswer, WorkflowError> {
        let workflow = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(id.as_str()))?;
        let conversation_id = workflow.conversation_id().map(str::to_string);
        let meta = RequestMeta::answer(workflow.context_id(), conversation_id.clone());
        let mut providers = RunProviders::default();

        self.tracker.record_step(id, Stage::InputProcessing).await;
        let input = self.normalize(workflow.input()).await?;

        // Extension point, nothing to check yet
        self.tracker.record_step(id, Stage::AmbiguityChecking).await;

        self.tracker.record_step(id, Stage::ContentRouting).await;
        let routing = self.route(id, &input).await;

        self.tracker.record_step(id, Stage::AgentProcessing).await;
        let mut dispatch = self
            .dispatch(id, &input, &routing, &meta, &mut providers)
            .await;

        self.tracker.record_step(id, Stage::VisualizationCheck).await;
        let standalone = self
            .check_visualization(id, &input, &mut dispatch, &mut providers)
            .await;

        self.tracker
            .record_step(id, Stage::MathematicalProcessing)
            .await;
        let computation = self
            .compute(id, &input, &dispatch, conversation_id, &mut providers)
            .await;

        self.tracker.record_step(id, Stage::ResponseGeneration).await;
        let answer = self
            .assemble(id, &input, dispatch, computation, standalone, &meta, &mut providers)
            .await;

        self.tracker.record_step(id, Stage::ContextPersistence).await;
        self.persist_context(id, workflow.context_id(), &input, &answer)
            .await;

        self.tracker.record_step(id, Stage::Finalization).await;
        Ok(answer)
    }

    async fn normalize(&self, input: &WorkflowInput) -> Result<TypedInput, WorkflowError> {
        match input {
            WorkflowInput::Typed(typed) => Ok(typed.clone()),
            WorkflowInput::Raw {
                content,
                content_type,
            } => Ok(self.normalizer.process(content, content_type).await?),
        }
    }

    async fn route(&self, id: &WorkflowId, input: &TypedInput) -> RoutingDecision {
        match self.router.route(input).await {
            Ok(decision) if decision.confidence >= self.config.min_routing_confidence => {
                debug!(
                    workflow_id = %id,
                    agent_type = decision.agent_type.as_str(),
                    confidence = decision.confidence,
                    "Content routed"
                );
                decision
            }
            Ok(decision) => {
                info!(
                    workflow_id = %id,
                    agent_type = decision.agent_type.as_str(),
                    confidence = decision.confidence,
                    "Routing confidence below threshold, using reasoning provider"
                );
                RoutingDecision::default_reasoning()
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "Content routing failed, using reasoning provider");
                record_degradation(Stage::ContentRouting, "router_failed");
                RoutingDecision::default_reasoning()
            }
        }
    }

    async fn dispatch(
        &self,
        id: &WorkflowId,
        input: &TypedInput,
        routing: &RoutingDecision,
        meta: &RequestMeta,
        providers: &mut RunProviders,
    ) -> DispatchOutcome {
        if let Some(result) = routing.terminal_result() {
            info!(
                workflow_id = %id,
                agent_type = routing.agent_type.as_str(),
                "Using upstream recognition result"
            );
            return DispatchOutcome::Passthrough(result.clone());
        }

        let was_cached = self.reasoning.is_cached().await;
        let Some(provider) = self.run_reasoning(providers).await else {
            warn!(workflow_id = %id, provider = "core_llm_agent", "Reasoning provider is not available");
            record_degradation(Stage::AgentProcessing, "provider_absent");
            return DispatchOutcome::Degraded(DegradedResult::new(
                "Reasoning provider is not available",
                input,
            ));
        };
        if !was_cached {
            info!(workflow_id = %id, provider = provider.name(), "Reasoning provider resolved on demand");
        }

        match provider.process_multimodal(input, meta).await {
            Ok(result) if result.has_answer() => DispatchOutcome::Success(result),
            Ok(result) => {
                let fallback = if result.success {
                    "Reasoning provider returned an empty response"
                } else {
                    "Reasoning provider reported failure"
                };
                let error = result.error.unwrap_or_else(|| fallback.to_string());
                warn!(workflow_id = %id, provider = provider.name(), error = %error, "Reasoning provider reported failure");
                record_degradation(Stage::AgentProcessing, "provider_reported_failure");
                DispatchOutcome::Degraded(DegradedResult::new(error, input))
            }
            Err(e) => {
                warn!(workflow_id = %id, provider = provider.name(), error = %e, "Reasoning provider failed");
                record_degradation(Stage::AgentProcessing, "provider_failed");
                self.reasoning.invalidate().await;
                DispatchOutcome::Degraded(DegradedResult::new(
                    format!("Reasoning failed: {}", e),
                    input,
                ))
            }
        }
    }

    /// Render a standalone visualization when textual input asks for one
    async fn check_visualization(
        &self,
        id: &WorkflowId,
        input: &TypedInput,
        dispatch: &mut DispatchOutcome,
        providers: &mut RunProviders,
    ) -> Option<Visualization> {
        let text = input.text_content()?;
        let Some(provider) = self.run_visualization(providers).await else {
            debug!(workflow_id = %id, "No visualization provider, skipping visualization check");
            return None;
        };

        let intent = match provider.analyze_intent(text).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(workflow_id = %id, provider = provider.name(), error = %e, "Visualization intent analysis failed");
                record_degradation(Stage::VisualizationCheck, "intent_failed");
                self.visualization.invalidate().await;
                return None;
            }
        };

        if !intent.is_confident(self.config.min_visualization_confidence) {
            debug!(
                workflow_id = %id,
                is_request = intent.is_request,
                confidence = intent.confidence,
                "No visualization requested"
            );
            return None;
        }

        let rendered = match provider.render(&intent).await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(workflow_id = %id, provider = provider.name(), error = %e, "Visualization rendering failed");
                record_degradation(Stage::VisualizationCheck, "render_failed");
                self.visualization.invalidate().await;
                return None;
            }
        };

        let render_error = rendered.error.clone();
        let Some(visualization) = rendered.into_visualization(intent.plot_type.clone()) else {
            warn!(workflow_id = %id, error = ?render_error, "Visualization rendering produced no output");
            return None;
        };

        let attached = dispatch.attach_visualization(&visualization);
        info!(
            workflow_id = %id,
            plot_type = ?visualization.plot_type,
            attached,
            "Visualization rendered"
        );
        Some(visualization)
    }

    async fn compute(
        &self,
        id: &WorkflowId,
        input: &TypedInput,
        dispatch: &DispatchOutcome,
        conversation_id: Option<String>,
        providers: &mut RunProviders,
    ) -> ComputationOutcome {
        if !dispatch.contains_math() {
            return ComputationOutcome::NotRequested;
        }
        let Some(query) = dispatch.computation_query() else {
            debug!(workflow_id = %id, "Math detected but no query could be derived");
            return ComputationOutcome::NotRequested;
        };

        let Some(provider) = self.run_computation(providers).await else {
            warn!(workflow_id = %id, provider = "math_computation_agent", "No computation provider available");
            record_degradation(Stage::MathematicalProcessing, "provider_absent");
            return ComputationOutcome::Unavailable { query };
        };

        let request = ComputationRequest::new(query.clone(), input.input_type, conversation_id);
        match provider.compute(&request).await {
            Ok(result) => {
                info!(workflow_id = %id, provider = provider.name(), success = result.success, "Computation finished");
                ComputationOutcome::Completed(result)
            }
            Err(e) => {
                warn!(workflow_id = %id, provider = provider.name(), error = %e, "Computation failed");
                record_degradation(Stage::MathematicalProcessing, "provider_failed");
                self.computation.invalidate().await;
                ComputationOutcome::Failed(ComputationResult::failure(
                    query,
                    format!("Mathematical processing failed: {}", e),
                ))
            }
        }
    }

    async fn assemble(
        &self,
        id: &WorkflowId,
        input: &TypedInput,
        dispatch: DispatchOutcome,
        computation: ComputationOutcome,
        standalone: Option<Visualization>,
        meta: &RequestMeta,
        providers: &mut RunProviders,
    ) -> FinalAnswer {
        let computation_viz = computation.result().and_then(|c| c.visualization.clone());
        let dispatch_viz = dispatch
            .visualization()
            .filter(|v| Some(v) != standalone.as_ref());

        let mut answer = match computation.successful() {
            Some(result) => self.synthesize(id, input, result, meta, providers).await,
            None => FinalAnswer::from_dispatch(dispatch),
        };

        answer.computation = computation.into_result();
        answer.merge_visualizations(
            [
                (VisualizationSource::Computation, computation_viz),
                (VisualizationSource::Dispatch, dispatch_viz),
                (VisualizationSource::Standalone, standalone),
            ]
            .into_iter()
            .filter_map(|(source, viz)| viz.map(|v| VisualizationEntry::new(source, v))),
        );
        answer
    }

    async fn synthesize(
        &self,
        id: &WorkflowId,
        input: &TypedInput,
        computation: &ComputationResult,
        meta: &RequestMeta,
        providers: &mut RunProviders,
    ) -> FinalAnswer {
        let Some(provider) = self.run_reasoning(providers).await else {
            info!(workflow_id = %id, "Reasoning provider unavailable, returning raw computation result");
            record_degradation(Stage::ResponseGeneration, "provider_absent");
            return FinalAnswer::from_computation(computation);
        };

        match provider
            .process_with_computed_result(input, computation, meta)
            .await
        {
            Ok(result) if result.has_answer() => FinalAnswer::synthesized(result),
            Ok(result) => {
                warn!(workflow_id = %id, error = ?result.error, "Synthesis reported failure, returning raw computation result");
                record_degradation(Stage::ResponseGeneration, "provider_reported_failure");
                FinalAnswer::from_computation(computation)
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "Synthesis failed, returning raw computation result");
                record_degradation(Stage::ResponseGeneration, "provider_failed");
                self.reasoning.invalidate().await;
                FinalAnswer::from_computation(computation)
            }
        }
    }

    async fn persist_context(
        &self,
        id: &WorkflowId,
        context_id: &str,
        input: &TypedInput,
        answer: &FinalAnswer,
    ) {
        if let Err(e) = self.store_interaction(context_id, input, answer).await {
            warn!(workflow_id = %id, context_id, error = %e, "Failed to store interaction in context");
        }
    }

    async fn store_interaction(
        &self,
        context_id: &str,
        input: &TypedInput,
        answer: &FinalAnswer,
    ) -> Result<(), DomainError> {
        if self.contexts.get_context(context_id).await?.is_none() {
            debug!(context_id, "Context not found, interaction not stored");
            return Ok(());
        }

        let to_value = |value: serde_json::Result<serde_json::Value>| {
            value.map_err(|e| DomainError::internal(e.to_string()))
        };

        let input_entity = ContextEntity::new(EntityType::Input, to_value(serde_json::to_value(input))?);
        let input_id = self
            .contexts
            .add_entity(context_id, input_entity, input.input_type.as_str())
            .await?;

        let response_entity =
            ContextEntity::new(EntityType::Response, to_value(serde_json::to_value(answer))?);
        let response_id = self
            .contexts
            .add_entity(context_id, response_entity, "text")
            .await?;

        self.contexts
            .add_relation(context_id, &input_id, &response_id, RelationKind::ResponseTo)
            .await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
