//! Application state shared by the HTTP handlers

use crate::infrastructure::services::QueryService;
use crate::infrastructure::workflow::WorkflowEngine;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub query_service: QueryService,
}

impl AppState {
    pub fn new(query_service: QueryService) -> Self {
        Self {
            engine: query_service.engine().clone(),
            query_service,
        }
    }
}
