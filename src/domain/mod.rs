//! Domain layer - Core orchestration entities and contracts

pub mod error;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod workflow;

pub use error::DomainError;
pub use pipeline::{
    AgentType, ContentRouter, ContextEntity, ContextStore, ConversationContext, EntityType,
    InputNormalizer, InputType, RelationKind, RoutingDecision, TypedInput,
};
pub use provider::{
    ComputationProvider, ComputationRequest, ComputationResult, QueryAnalysis, ReasoningProvider,
    ReasoningResult, RequestMeta, VisualizationProvider,
};
pub use registry::ServiceRegistry;
pub use workflow::{
    FinalAnswer, Stage, Workflow, WorkflowError, WorkflowId, WorkflowInput, WorkflowState,
    WorkflowStore,
};
