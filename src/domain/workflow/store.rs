use async_trait::async_trait;

use super::entity::{Workflow, WorkflowId};
use super::error::WorkflowError;

/// Fallible in-place update applied under exclusive access to one workflow
pub type WorkflowMutation = Box<dyn FnOnce(&mut Workflow) -> Result<(), WorkflowError> + Send>;

/// Shared map of workflows. Entries are isolated: a mutation of one id never
/// blocks readers or writers of another.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Insert a new workflow. Fails with `Conflict` on a duplicate id.
    async fn create(&self, workflow: Workflow) -> Result<(), WorkflowError>;

    /// Snapshot of a workflow, `None` for unknown or evicted ids
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, WorkflowError>;

    /// Apply a mutation and return the committed snapshot. A failed mutation
    /// leaves the stored workflow untouched.
    async fn mutate(
        &self,
        id: &WorkflowId,
        mutation: WorkflowMutation,
    ) -> Result<Workflow, WorkflowError>;

    async fn len(&self) -> usize;
}
