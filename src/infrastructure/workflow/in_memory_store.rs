//! In-memory workflow store backed by moka

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::workflow::{
    Workflow, WorkflowError, WorkflowId, WorkflowMutation, WorkflowStore,
};

/// Retention policy for finished workflows
#[derive(Debug, Clone)]
pub struct WorkflowStoreConfig {
    /// Maximum number of finished workflows kept
    pub max_capacity: u64,
    /// Finished workflows are evicted this long after they finish
    pub retention: Duration,
}

impl Default for WorkflowStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            retention: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl WorkflowStoreConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

type Entry = Arc<Mutex<Workflow>>;

/// Workflow store where each entry has its own lock.
///
/// Workflows still running live in an unbounded map and are never evicted.
/// Once a mutation makes a workflow terminal it moves to a moka cache bounded
/// by capacity and time to live. Evicted workflows behave like unknown ids.
#[derive(Debug, Clone)]
pub struct InMemoryWorkflowStore {
    active: Arc<RwLock<HashMap<WorkflowId, Entry>>>,
    finished: MokaCache<WorkflowId, Entry>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::with_config(WorkflowStoreConfig::default())
    }

    pub fn with_config(config: WorkflowStoreConfig) -> Self {
        let finished = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.retention)
            .build();

        Self {
            active: Arc::new(RwLock::new(HashMap::new())),
            finished,
        }
    }

    /// Active entries are checked first. A workflow is inserted into the
    /// finished cache before it leaves the active map, so a concurrent lookup
    /// always finds it in one of the two.
    async fn entry(&self, id: &WorkflowId) -> Option<Entry> {
        if let Some(entry) = self.active.read().await.get(id).cloned() {
            return Some(entry);
        }
        self.finished.get(id).await
    }

    async fn retire(&self, id: &WorkflowId, entry: Entry) {
        self.finished.insert(id.clone(), entry).await;
        self.active.write().await.remove(id);
        debug!(workflow_id = %id, "Workflow moved to retention cache");
    }
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create(&self, workflow: Workflow) -> Result<(), WorkflowError> {
        let id = workflow.id().clone();
        let mut active = self.active.write().await;
        if active.contains_key(&id) || self.finished.contains_key(&id) {
            return Err(WorkflowError::conflict(id.as_str()));
        }

        if workflow.is_terminal() {
            self.finished
                .insert(id, Arc::new(Mutex::new(workflow)))
                .await;
        } else {
            active.insert(id, Arc::new(Mutex::new(workflow)));
        }
        Ok(())
    }

    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, WorkflowError> {
        match self.entry(id).await {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn mutate(
        &self,
        id: &WorkflowId,
        mutation: WorkflowMutation,
    ) -> Result<Workflow, WorkflowError> {
        let entry = self
            .entry(id)
            .await
            .ok_or_else(|| WorkflowError::not_found(id.as_str()))?;

        let mut guard = entry.lock().await;
        let was_terminal = guard.is_terminal();
        let mut updated = guard.clone();
        mutation(&mut updated)?;
        *guard = updated.clone();

        if !was_terminal && updated.is_terminal() {
            self.retire(id, entry.clone()).await;
        }
        Ok(updated)
    }

    async fn len(&self) -> usize {
        self.finished.run_pending_tasks().await;
        self.active.read().await.len() + self.finished.entry_count() as usize
    }
}
