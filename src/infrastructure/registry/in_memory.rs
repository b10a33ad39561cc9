//! Registry of collaborators and providers held in memory
//!
//! Every capability lives in its own slot. A slot is empty, holds a live
//! instance, or holds a factory that builds the instance on resolution.
//! Slots can be replaced or cleared while the service runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::domain::pipeline::{ContentRouter, ContextStore, InputNormalizer};
use crate::domain::provider::{ComputationProvider, ReasoningProvider, VisualizationProvider};
use crate::domain::registry::{
    COMPUTATION_PROVIDER_ID, CONTENT_ROUTER_ID, CONTEXT_MANAGER_ID, INPUT_PROCESSOR_ID,
    REASONING_PROVIDER_ID, ServiceRegistry, VISUALIZATION_PROVIDER_ID,
};
use crate::domain::DomainError;
use crate::infrastructure::pipeline::{
    ContentTypeInputNormalizer, InMemoryContextStore, KeywordContentRouter,
};

/// Lazily builds a provider instance
pub type ProviderFactory<T> = Arc<dyn Fn() -> Result<Arc<T>, DomainError> + Send + Sync>;

enum SlotState<T: ?Sized> {
    Empty,
    Ready(Arc<T>),
    Factory(ProviderFactory<T>),
}

impl<T: ?Sized> Clone for SlotState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Ready(instance) => Self::Ready(instance.clone()),
            Self::Factory(factory) => Self::Factory(factory.clone()),
        }
    }
}

struct Slot<T: ?Sized> {
    id: &'static str,
    state: RwLock<SlotState<T>>,
}

impl<T: ?Sized> Slot<T> {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            state: RwLock::new(SlotState::Empty),
        }
    }

    fn replace(&self, state: SlotState<T>) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        *guard = state;
    }

    fn snapshot(&self) -> SlotState<T> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn is_registered(&self) -> bool {
        !matches!(self.snapshot(), SlotState::Empty)
    }

    /// Resolve the slot. Factory errors are logged and treated as absence.
    fn resolve(&self) -> Option<Arc<T>> {
        match self.snapshot() {
            SlotState::Empty => {
                debug!(service = self.id, "Service not registered");
                None
            }
            SlotState::Ready(instance) => Some(instance),
            SlotState::Factory(factory) => match factory() {
                Ok(instance) => Some(instance),
                Err(e) => {
                    warn!(service = self.id, error = %e, "Service factory failed");
                    None
                }
            },
        }
    }

    fn require(&self) -> Result<Arc<T>, DomainError> {
        self.resolve()
            .ok_or_else(|| DomainError::not_found(format!("Service '{}' not registered", self.id)))
    }
}

pub struct InMemoryServiceRegistry {
    input_normalizer: Slot<dyn InputNormalizer>,
    content_router: Slot<dyn ContentRouter>,
    context_store: Slot<dyn ContextStore>,
    reasoning: Slot<dyn ReasoningProvider>,
    computation: Slot<dyn ComputationProvider>,
    visualization: Slot<dyn VisualizationProvider>,
    revision: AtomicU64,
}

impl std::fmt::Debug for InMemoryServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryServiceRegistry")
            .field(INPUT_PROCESSOR_ID, &self.input_normalizer.is_registered())
            .field(CONTENT_ROUTER_ID, &self.content_router.is_registered())
            .field(CONTEXT_MANAGER_ID, &self.context_store.is_registered())
            .field(REASONING_PROVIDER_ID, &self.reasoning.is_registered())
            .field(COMPUTATION_PROVIDER_ID, &self.computation.is_registered())
            .field(VISUALIZATION_PROVIDER_ID, &self.visualization.is_registered())
            .field("revision", &self.revision())
            .finish()
    }
}

impl InMemoryServiceRegistry {
    /// Registry with every slot empty
    pub fn new() -> Self {
        Self {
            input_normalizer: Slot::new(INPUT_PROCESSOR_ID),
            content_router: Slot::new(CONTENT_ROUTER_ID),
            context_store: Slot::new(CONTEXT_MANAGER_ID),
            reasoning: Slot::new(REASONING_PROVIDER_ID),
            computation: Slot::new(COMPUTATION_PROVIDER_ID),
            visualization: Slot::new(VISUALIZATION_PROVIDER_ID),
            revision: AtomicU64::new(0),
        }
    }

    /// Registry with the built-in collaborators and no providers
    pub fn with_default_collaborators() -> Self {
        let registry = Self::new();
        registry.set_input_normalizer(Arc::new(ContentTypeInputNormalizer::new()));
        registry.set_content_router(Arc::new(KeywordContentRouter::new()));
        registry.set_context_store(Arc::new(InMemoryContextStore::new()));
        registry
    }

    fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_input_normalizer(&self, normalizer: Arc<dyn InputNormalizer>) {
        self.input_normalizer.replace(SlotState::Ready(normalizer));
    }

    pub fn set_content_router(&self, router: Arc<dyn ContentRouter>) {
        self.content_router.replace(SlotState::Ready(router));
    }

    pub fn set_context_store(&self, store: Arc<dyn ContextStore>) {
        self.context_store.replace(SlotState::Ready(store));
    }

    pub fn set_reasoning_provider(&self, provider: Arc<dyn ReasoningProvider>) {
        info!(provider = REASONING_PROVIDER_ID, "Registering provider");
        self.reasoning.replace(SlotState::Ready(provider));
        self.bump_revision();
    }

    pub fn set_reasoning_factory(&self, factory: ProviderFactory<dyn ReasoningProvider>) {
        self.reasoning.replace(SlotState::Factory(factory));
        self.bump_revision();
    }

    pub fn clear_reasoning_provider(&self) {
        self.reasoning.replace(SlotState::Empty);
        self.bump_revision();
    }

    pub fn set_computation_provider(&self, provider: Arc<dyn ComputationProvider>) {
        info!(provider = COMPUTATION_PROVIDER_ID, "Registering provider");
        self.computation.replace(SlotState::Ready(provider));
        self.bump_revision();
    }

    pub fn set_computation_factory(&self, factory: ProviderFactory<dyn ComputationProvider>) {
        self.computation.replace(SlotState::Factory(factory));
        self.bump_revision();
    }

    pub fn clear_computation_provider(&self) {
        self.computation.replace(SlotState::Empty);
        self.bump_revision();
    }

    pub fn set_visualization_provider(&self, provider: Arc<dyn VisualizationProvider>) {
        info!(provider = VISUALIZATION_PROVIDER_ID, "Registering provider");
        self.visualization.replace(SlotState::Ready(provider));
        self.bump_revision();
    }

    pub fn set_visualization_factory(&self, factory: ProviderFactory<dyn VisualizationProvider>) {
        self.visualization.replace(SlotState::Factory(factory));
        self.bump_revision();
    }

    pub fn clear_visualization_provider(&self) {
        self.visualization.replace(SlotState::Empty);
        self.bump_revision();
    }
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn input_normalizer(&self) -> Result<Arc<dyn InputNormalizer>, DomainError> {
        self.input_normalizer.require()
    }

    fn content_router(&self) -> Result<Arc<dyn ContentRouter>, DomainError> {
        self.content_router.require()
    }

    fn context_store(&self) -> Result<Arc<dyn ContextStore>, DomainError> {
        self.context_store.require()
    }

    fn reasoning_provider(&self) -> Option<Arc<dyn ReasoningProvider>> {
        self.reasoning.resolve()
    }

    fn computation_provider(&self) -> Option<Arc<dyn ComputationProvider>> {
        self.computation.resolve()
    }

    fn visualization_provider(&self) -> Option<Arc<dyn VisualizationProvider>> {
        self.visualization.resolve()
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}
