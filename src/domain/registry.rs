//! Service registry contract
//!
//! Required collaborators resolve to an error when missing. Capability
//! providers resolve to `None`: absence is a normal condition the engine
//! degrades around.

use std::sync::Arc;

use crate::domain::pipeline::{ContentRouter, ContextStore, InputNormalizer};
use crate::domain::provider::{ComputationProvider, ReasoningProvider, VisualizationProvider};
use crate::domain::DomainError;

pub const INPUT_PROCESSOR_ID: &str = "input_processor";
pub const CONTENT_ROUTER_ID: &str = "content_router";
pub const CONTEXT_MANAGER_ID: &str = "context_manager";
pub const REASONING_PROVIDER_ID: &str = "core_llm_agent";
pub const COMPUTATION_PROVIDER_ID: &str = "math_computation_agent";
pub const VISUALIZATION_PROVIDER_ID: &str = "visualization_agent";

pub trait ServiceRegistry: Send + Sync {
    fn input_normalizer(&self) -> Result<Arc<dyn InputNormalizer>, DomainError>;

    fn content_router(&self) -> Result<Arc<dyn ContentRouter>, DomainError>;

    fn context_store(&self) -> Result<Arc<dyn ContextStore>, DomainError>;

    fn reasoning_provider(&self) -> Option<Arc<dyn ReasoningProvider>>;

    fn computation_provider(&self) -> Option<Arc<dyn ComputationProvider>>;

    fn visualization_provider(&self) -> Option<Arc<dyn VisualizationProvider>>;

    /// Changes whenever a provider is registered, replaced or removed.
    /// Lookups cached at an older revision are stale.
    fn revision(&self) -> u64;
}
