//! Read-side views of a workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::answer::FinalAnswer;
use super::entity::{StepRecord, Workflow, WorkflowState};
use super::error::WorkflowError;

/// Returned when a workflow is accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStarted {
    pub workflow_id: String,
    pub context_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub state: WorkflowState,
    pub message: String,
}

impl From<&Workflow> for WorkflowStarted {
    fn from(workflow: &Workflow) -> Self {
        Self {
            workflow_id: workflow.id().to_string(),
            context_id: workflow.context_id().to_string(),
            conversation_id: workflow.conversation_id().map(str::to_string),
            state: workflow.state(),
            message: "Workflow started".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub workflow_id: String,
    pub state: WorkflowState,
    pub current_step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    pub steps_completed: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowStatus {
    fn from(workflow: &Workflow) -> Self {
        Self {
            workflow_id: workflow.id().to_string(),
            state: workflow.state(),
            current_step: workflow.current_step(),
            current_stage: workflow.steps().last().map(|s| s.name.clone()),
            steps_completed: workflow.steps().len(),
            created_at: workflow.created_at(),
            updated_at: workflow.updated_at(),
        }
    }
}

/// Result of a completed workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub success: bool,
    pub workflow_id: String,
    pub result: FinalAnswer,
    pub steps: Vec<StepRecord>,
}

impl TryFrom<&Workflow> for WorkflowOutcome {
    type Error = WorkflowError;

    fn try_from(workflow: &Workflow) -> Result<Self, Self::Error> {
        match (workflow.state(), workflow.result()) {
            (WorkflowState::Completed, Some(result)) => Ok(Self {
                success: true,
                workflow_id: workflow.id().to_string(),
                result: result.clone(),
                steps: workflow.steps().to_vec(),
            }),
            (state, _) => Err(WorkflowError::not_completed(workflow.id().as_str(), state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::WorkflowInput;

    #[test]
    fn test_status_view() {
        let mut workflow = Workflow::new(WorkflowInput::text("x"), "ctx-1", None);
        workflow.mark_processing().unwrap();
        workflow.record_step("input_processing", "Processing input").unwrap();

        let status = WorkflowStatus::from(&workflow);
        assert_eq!(status.state, WorkflowState::Processing);
        assert_eq!(status.current_step, 1);
        assert_eq!(status.current_stage.as_deref(), Some("input_processing"));
    }

    #[test]
    fn test_outcome_requires_completion() {
        let mut workflow = Workflow::new(WorkflowInput::text("x"), "ctx-1", None);
        workflow.mark_processing().unwrap();

        let err = WorkflowOutcome::try_from(&workflow).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::NotCompleted {
                state: WorkflowState::Processing,
                ..
            }
        ));

        workflow
            .mark_completed(FinalAnswer::degraded_placeholder("absent"))
            .unwrap();
        let outcome = WorkflowOutcome::try_from(&workflow).unwrap();
        assert!(outcome.success);
        assert!(!outcome.result.success);
    }
}
