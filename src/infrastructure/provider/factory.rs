use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::http_client::HttpClient;
use super::{HttpComputationProvider, HttpReasoningProvider, HttpVisualizationProvider};
use crate::domain::provider::{ComputationProvider, ReasoningProvider, VisualizationProvider};
use crate::domain::registry::{
    COMPUTATION_PROVIDER_ID, REASONING_PROVIDER_ID, VISUALIZATION_PROVIDER_ID,
};
use crate::domain::DomainError;
use crate::infrastructure::registry::InMemoryServiceRegistry;

/// Remote provider endpoints. A provider without a URL stays absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub reasoning_url: Option<String>,
    #[serde(default)]
    pub computation_url: Option<String>,
    #[serde(default)]
    pub visualization_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            reasoning_url: None,
            computation_url: None,
            visualization_url: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn configured(url: &Option<String>) -> Option<String> {
    url.as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Registers HTTP provider adapters as lazy factories
#[derive(Debug)]
pub struct HttpProviderFactory;

impl HttpProviderFactory {
    /// Register a factory for every configured endpoint.
    /// Returns the ids of the registered providers.
    pub fn register(
        registry: &InMemoryServiceRegistry,
        config: &ProvidersConfig,
    ) -> Result<Vec<&'static str>, DomainError> {
        let client = HttpClient::with_timeout(Duration::from_millis(config.request_timeout_ms))?;
        let mut registered = Vec::new();

        if let Some(url) = configured(&config.reasoning_url) {
            let client = client.clone();
            registry.set_reasoning_factory(Arc::new(move || {
                Ok(Arc::new(HttpReasoningProvider::new(client.clone(), url.clone()))
                    as Arc<dyn ReasoningProvider>)
            }));
            registered.push(REASONING_PROVIDER_ID);
        }

        if let Some(url) = configured(&config.computation_url) {
            let client = client.clone();
            registry.set_computation_factory(Arc::new(move || {
                Ok(Arc::new(HttpComputationProvider::new(client.clone(), url.clone()))
                    as Arc<dyn ComputationProvider>)
            }));
            registered.push(COMPUTATION_PROVIDER_ID);
        }

        if let Some(url) = configured(&config.visualization_url) {
            registry.set_visualization_factory(Arc::new(move || {
                Ok(Arc::new(HttpVisualizationProvider::new(client.clone(), url.clone()))
                    as Arc<dyn VisualizationProvider>)
            }));
            registered.push(VISUALIZATION_PROVIDER_ID);
        }

        info!(providers = ?registered, "Remote providers registered");
        Ok(registered)
    }
}
