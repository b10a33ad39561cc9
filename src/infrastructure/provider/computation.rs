use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http_client::{HttpClientTrait, decode};
use crate::domain::provider::{ComputationProvider, ComputationRequest, ComputationResult};
use crate::domain::registry::COMPUTATION_PROVIDER_ID;
use crate::domain::DomainError;

/// Computation provider reached over HTTP
#[derive(Debug)]
pub struct HttpComputationProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> HttpComputationProvider<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> ComputationProvider for HttpComputationProvider<C> {
    async fn compute(
        &self,
        request: &ComputationRequest,
    ) -> Result<ComputationResult, DomainError> {
        let url = format!("{}/compute", self.base_url);
        debug!(provider = COMPUTATION_PROVIDER_ID, url = %url, "Calling computation provider");

        let response = self
            .client
            .post_json(COMPUTATION_PROVIDER_ID, &url, &json!(request))
            .await?;

        let mut result: ComputationResult = decode(COMPUTATION_PROVIDER_ID, response)?;
        if result.query.is_empty() {
            result.query = request.query.clone();
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        COMPUTATION_PROVIDER_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::InputType;
    use crate::infrastructure::provider::HttpClient;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_compute_posts_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compute"))
            .and(body_json(json!({
                "query": "integrate(x**2, x)",
                "input_type": "text",
                "requires_explanation": true,
                "conversation_id": "conv-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "x**3/3",
                "explanation": "Power rule",
                "steps": [{"rule": "power"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpComputationProvider::new(HttpClient::new(), server.uri());
        let result = provider
            .compute(&ComputationRequest::new(
                "integrate(x**2, x)",
                InputType::Text,
                Some("conv-1".to_string()),
            ))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.query, "integrate(x**2, x)");
        assert_eq!(result.result, Some(json!("x**3/3")));
        assert_eq!(result.summary(), "Power rule");
        assert_eq!(result.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_reported_failure_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compute"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "query": "1/0",
                "error": "division by zero"
            })))
            .mount(&server)
            .await;

        let provider = HttpComputationProvider::new(HttpClient::new(), server.uri());
        let result = provider
            .compute(&ComputationRequest::new("1/0", InputType::Text, None))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("division by zero"));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let provider = HttpComputationProvider::new(HttpClient::new(), "http://127.0.0.1:1");
        let err = provider
            .compute(&ComputationRequest::new("1+1", InputType::Text, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
    }
}
