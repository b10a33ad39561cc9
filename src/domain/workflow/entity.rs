//! Workflow domain entities

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::answer::FinalAnswer;
use super::error::WorkflowError;
use crate::domain::pipeline::TypedInput;

/// Regex pattern for valid workflow IDs: wf-{uuid}
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^wf-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").unwrap()
});

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 39; // "wf-" + 36 char UUID

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_workflow_id(&id)?;
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("wf-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn validate_workflow_id(id: &str) -> Result<(), WorkflowError> {
    if id.is_empty() {
        return Err(WorkflowError::invalid_id("Workflow ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::invalid_id(format!(
            "Workflow ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(WorkflowError::invalid_id(format!(
            "Invalid workflow ID '{}': must be in format wf-{{uuid}}",
            id
        )));
    }

    Ok(())
}

/// Lifecycle state of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Initializing,
    Processing,
    Completed,
    Error,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn can_transition_to(&self, target: WorkflowState) -> bool {
        matches!(
            (self, target),
            (Self::Initializing, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One pipeline stage entered by a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

/// What a workflow was started with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowInput {
    /// Already normalized, skips the input normalizer
    Typed(TypedInput),

    Raw {
        content: String,
        #[serde(default = "default_content_type")]
        content_type: String,
    },
}

impl WorkflowInput {
    pub fn raw(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::Raw {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::raw(content, default_content_type())
    }
}

/// A single execution of the orchestration pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,

    state: WorkflowState,

    input: WorkflowInput,

    context_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,

    /// Append-only
    steps: Vec<StepRecord>,

    /// Present only once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<FinalAnswer>,

    /// Present only once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(
        input: WorkflowInput,
        context_id: impl Into<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self::with_id(WorkflowId::generate(), input, context_id, conversation_id)
    }

    pub fn with_id(
        id: WorkflowId,
        input: WorkflowInput,
        context_id: impl Into<String>,
        conversation_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: WorkflowState::Initializing,
            input,
            context_id: context_id.into(),
            conversation_id,
            steps: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn input(&self) -> &WorkflowInput {
        &self.input
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn current_step(&self) -> usize {
        self.steps.len()
    }

    pub fn result(&self) -> Option<&FinalAnswer> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn mark_processing(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowState::Processing)?;
        self.touch();
        Ok(())
    }

    /// Append a step record. Timestamps are strictly increasing.
    pub fn record_step(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        if self.state.is_terminal() {
            return Err(WorkflowError::invalid_transition(
                self.state,
                "record_step",
                "workflow is already terminal",
            ));
        }

        let now = Utc::now();
        let timestamp = match self.steps.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::microseconds(1),
            _ => now,
        };

        self.steps.push(StepRecord {
            name: name.into(),
            description: description.into(),
            timestamp,
        });
        self.updated_at = self.updated_at.max(timestamp);
        Ok(())
    }

    pub fn mark_completed(&mut self, result: FinalAnswer) -> Result<(), WorkflowError> {
        self.transition(WorkflowState::Completed)?;
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), WorkflowError> {
        self.transition(WorkflowState::Error)?;
        self.error = Some(error.into());
        self.touch();
        Ok(())
    }

    fn transition(&mut self, target: WorkflowState) -> Result<(), WorkflowError> {
        if !self.state.can_transition_to(target) {
            let reason = if self.state.is_terminal() {
                "workflow is already terminal"
            } else {
                "transition not allowed"
            };
            return Err(WorkflowError::invalid_transition(
                self.state,
                target.to_string(),
                reason,
            ));
        }
        self.state = target;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::InputType;
    use serde_json::json;

    fn processing_workflow() -> Workflow {
        let mut workflow = Workflow::new(WorkflowInput::text("2 + 2"), "ctx-1", None);
        workflow.mark_processing().unwrap();
        workflow
    }

    #[test]
    fn test_workflow_id_generate() {
        let id = WorkflowId::generate();
        assert!(id.as_str().starts_with("wf-"));
        assert_eq!(id.as_str().len(), MAX_ID_LENGTH);
        assert!(WorkflowId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_workflow_id_invalid() {
        assert!(WorkflowId::new("").is_err());
        assert!(WorkflowId::new("wf-nope").is_err());
        assert!(WorkflowId::new("op-12345678-1234-1234-1234-123456789abc").is_err());
    }

    #[test]
    fn test_workflow_id_serialization() {
        let id = WorkflowId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: WorkflowId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
        assert!(serde_json::from_str::<WorkflowId>("\"bogus\"").is_err());
    }

    #[test]
    fn test_state_transitions() {
        assert!(WorkflowState::Initializing.can_transition_to(WorkflowState::Processing));
        assert!(WorkflowState::Processing.can_transition_to(WorkflowState::Completed));
        assert!(WorkflowState::Processing.can_transition_to(WorkflowState::Error));
        assert!(!WorkflowState::Initializing.can_transition_to(WorkflowState::Completed));
        assert!(!WorkflowState::Completed.can_transition_to(WorkflowState::Error));
        assert!(!WorkflowState::Error.can_transition_to(WorkflowState::Processing));
    }

    #[test]
    fn test_new_workflow_is_initializing() {
        let workflow = Workflow::new(WorkflowInput::text("hello"), "ctx-1", Some("c-1".into()));
        assert_eq!(workflow.state(), WorkflowState::Initializing);
        assert_eq!(workflow.current_step(), 0);
        assert_eq!(workflow.conversation_id(), Some("c-1"));
        assert!(workflow.result().is_none());
        assert!(workflow.error().is_none());
    }

    #[test]
    fn test_step_timestamps_strictly_increase() {
        let mut workflow = processing_workflow();
        for i in 0..50 {
            workflow.record_step(format!("step_{i}"), "test step").unwrap();
        }

        assert_eq!(workflow.current_step(), 50);
        assert!(
            workflow
                .steps()
                .windows(2)
                .all(|pair| pair[0].timestamp < pair[1].timestamp)
        );
        assert!(workflow.updated_at() >= workflow.steps().last().unwrap().timestamp);
    }

    #[test]
    fn test_terminal_workflow_rejects_mutation() {
        let mut workflow = processing_workflow();
        workflow.mark_failed("boom").unwrap();

        assert!(matches!(
            workflow.record_step("late", "too late"),
            Err(WorkflowError::InvalidTransition { .. })
        ));
        assert!(workflow.mark_failed("again").is_err());
        assert!(workflow.mark_processing().is_err());
        assert_eq!(workflow.error(), Some("boom"));
        assert_eq!(workflow.current_step(), 0);
    }

    #[test]
    fn test_cannot_complete_before_processing() {
        let mut workflow = Workflow::new(WorkflowInput::text("x"), "ctx-1", None);
        let err = workflow
            .mark_completed(FinalAnswer::degraded_placeholder("x"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_completed_workflow_holds_result() {
        let mut workflow = processing_workflow();
        workflow
            .mark_completed(FinalAnswer::degraded_placeholder("no provider"))
            .unwrap();
        assert_eq!(workflow.state(), WorkflowState::Completed);
        assert!(workflow.result().is_some());
        assert!(workflow.error().is_none());
    }

    #[test]
    fn test_input_untagged_deserialization() {
        let typed: WorkflowInput =
            serde_json::from_value(json!({"input_type": "latex", "content": "\\int x"})).unwrap();
        match typed {
            WorkflowInput::Typed(input) => assert_eq!(input.input_type, InputType::Latex),
            other => panic!("expected typed input, got {other:?}"),
        }

        let raw: WorkflowInput = serde_json::from_value(json!({"content": "2 + 2"})).unwrap();
        assert_eq!(raw, WorkflowInput::text("2 + 2"));
    }
}
