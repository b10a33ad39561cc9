use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http_client::{HttpClientTrait, decode};
use crate::domain::provider::{RenderedVisualization, VisualizationIntent, VisualizationProvider};
use crate::domain::registry::VISUALIZATION_PROVIDER_ID;
use crate::domain::DomainError;

/// Visualization provider reached over HTTP
#[derive(Debug)]
pub struct HttpVisualizationProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> HttpVisualizationProvider<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/visualization/{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl<C: HttpClientTrait> VisualizationProvider for HttpVisualizationProvider<C> {
    async fn analyze_intent(&self, text: &str) -> Result<VisualizationIntent, DomainError> {
        let url = self.url("intent");
        debug!(provider = VISUALIZATION_PROVIDER_ID, url = %url, "Analyzing visualization intent");
        let response = self
            .client
            .post_json(VISUALIZATION_PROVIDER_ID, &url, &json!({ "text": text }))
            .await?;
        decode(VISUALIZATION_PROVIDER_ID, response)
    }

    async fn render(
        &self,
        intent: &VisualizationIntent,
    ) -> Result<RenderedVisualization, DomainError> {
        let url = self.url("render");
        debug!(provider = VISUALIZATION_PROVIDER_ID, url = %url, plot_type = ?intent.plot_type, "Rendering visualization");
        let response = self
            .client
            .post_json(VISUALIZATION_PROVIDER_ID, &url, &json!(intent))
            .await?;
        decode(VISUALIZATION_PROVIDER_ID, response)
    }

    fn name(&self) -> &str {
        VISUALIZATION_PROVIDER_ID
    }
}
