use serde::{Deserialize, Serialize};

use crate::domain::workflow::{WorkflowError, WorkflowId, WorkflowInput};

/// Body of `POST /v1/workflows`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartWorkflowRequest {
    pub input: WorkflowInput,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Workflow id taken from the URL path
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowIdPath {
    pub id: String,
}

impl WorkflowIdPath {
    /// Malformed ids can never name a workflow, so they read as unknown
    pub fn parse(&self) -> Result<WorkflowId, WorkflowError> {
        WorkflowId::new(self.id.as_str()).map_err(|_| WorkflowError::not_found(self.id.as_str()))
    }
}
