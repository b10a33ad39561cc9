//! Capability providers
//!
//! Providers are optional: the engine resolves them lazily through the
//! registry and degrades when one is absent or fails.

mod analysis;
mod computation;
mod reasoning;
mod types;
mod visualization;

pub use analysis::{ANALYSIS_PROMPT, Complexity, QueryAnalysis, RoutingSummary};
pub use computation::ComputationProvider;
pub use reasoning::ReasoningProvider;
pub use types::{
    ComputationRequest, ComputationResult, ReasoningResult, RenderedVisualization, RequestMeta,
    RequestMode, Visualization, VisualizationIntent,
};
pub use visualization::VisualizationProvider;
