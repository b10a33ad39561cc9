//! Workflow error types

use thiserror::Error;

use super::entity::WorkflowState;
use crate::domain::DomainError;

/// Errors raised by the workflow engine, its store and the query facade
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Workflow '{id}' is not completed (state: {state})")]
    NotCompleted { id: String, state: WorkflowState },

    #[error("Invalid state transition from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: WorkflowState,
        to: String,
        reason: String,
    },

    #[error("Invalid workflow ID: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Workflow already exists: {0}")]
    Conflict(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Workflow cancelled")]
    Cancelled,

    #[error("Timed out after {waited_ms}ms waiting for workflow '{id}'")]
    Timeout { id: String, waited_ms: u64 },
}

impl WorkflowError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn not_completed(id: impl Into<String>, state: WorkflowState) -> Self {
        Self::NotCompleted {
            id: id.into(),
            state,
        }
    }

    pub fn invalid_transition(
        from: WorkflowState,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            from,
            to: to.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict(id.into())
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    pub fn timeout(id: impl Into<String>, waited_ms: u64) -> Self {
        Self::Timeout {
            id: id.into(),
            waited_ms,
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidInput { message } | DomainError::Validation { message } => {
                Self::InvalidInput(message)
            }
            other => Self::Engine(other.to_string()),
        }
    }
}
