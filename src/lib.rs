//! MathFlow orchestrator
//!
//! Runs user queries through a fixed multi-stage workflow that coordinates
//! pluggable providers:
//! - a reasoning provider that answers or delegates
//! - a computation provider for symbolic and numeric work
//! - a visualization provider that renders plots
//!
//! Missing or failing providers degrade the answer instead of failing it.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use infrastructure::provider::HttpProviderFactory;
use infrastructure::registry::InMemoryServiceRegistry;
use infrastructure::services::QueryService;
use infrastructure::workflow::{InMemoryWorkflowStore, WorkflowEngine};

/// Application state from the default configuration sources
pub async fn create_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::load().unwrap_or_default();
    create_app_state_with_config(&config).await
}

/// Wire the registry, store, engine and query service
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let registry = Arc::new(InMemoryServiceRegistry::with_default_collaborators());
    let providers = HttpProviderFactory::register(&registry, &config.providers)?;
    if providers.is_empty() {
        info!("No remote providers configured, answers will be degraded");
    }

    let store = Arc::new(InMemoryWorkflowStore::with_config(config.engine.store()));
    let engine = WorkflowEngine::build(registry, store, config.engine.engine()).await?;
    let query_service = QueryService::new(engine, config.engine.query_service());

    Ok(AppState::new(query_service))
}
