//! Workflow infrastructure: store, step tracking, provider caching and the engine

mod engine;
mod in_memory_store;
mod provider_cache;
mod step_tracker;

pub use engine::{ProviderAvailability, WorkflowEngine, WorkflowEngineConfig, WorkflowHandle};
pub use in_memory_store::{InMemoryWorkflowStore, WorkflowStoreConfig};
pub use provider_cache::ProviderCache;
pub use step_tracker::StepTracker;
