use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::workflow::{Stage, Workflow, WorkflowError, WorkflowId, WorkflowStore};

/// Records pipeline progress on stored workflows. Never fails: a missing or
/// already terminal workflow is logged and skipped.
#[derive(Clone)]
pub struct StepTracker {
    store: Arc<dyn WorkflowStore>,
}

impl std::fmt::Debug for StepTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepTracker").finish_non_exhaustive()
    }
}

impl StepTracker {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    pub async fn record_step(&self, id: &WorkflowId, stage: Stage) {
        let result = self
            .store
            .mutate(
                id,
                Box::new(move |w: &mut Workflow| w.record_step(stage.name(), stage.description())),
            )
            .await;

        match result {
            Ok(workflow) => {
                info!(
                    workflow_id = %id,
                    stage = stage.name(),
                    step = workflow.current_step(),
                    "Workflow step"
                );
            }
            Err(WorkflowError::NotFound(_)) => {
                debug!(workflow_id = %id, stage = stage.name(), "Step for unknown workflow ignored");
            }
            Err(e) => {
                debug!(workflow_id = %id, stage = stage.name(), error = %e, "Step not recorded");
            }
        }
    }
}
