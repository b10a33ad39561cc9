//! Workflow domain module
//!
//! A workflow is one execution of the orchestration pipeline for a single
//! query. It moves `initializing -> processing -> completed | error`, keeps an
//! append-only list of step records and, once completed, the final answer.

mod answer;
mod entity;
mod error;
mod stage;
mod status;
mod store;

pub use answer::{
    AnswerSource, ComputationOutcome, DEGRADED_RESPONSE, DegradedResult, DispatchOutcome,
    FinalAnswer, VisualizationEntry, VisualizationSource,
};
pub use entity::{
    MAX_ID_LENGTH, StepRecord, Workflow, WorkflowId, WorkflowInput, WorkflowState,
    validate_workflow_id,
};
pub use error::WorkflowError;
pub use stage::Stage;
pub use status::{WorkflowOutcome, WorkflowStarted, WorkflowStatus};
pub use store::{WorkflowMutation, WorkflowStore};
