use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::http_client::{HttpClientTrait, decode};
use crate::domain::pipeline::TypedInput;
use crate::domain::provider::{ComputationResult, ReasoningProvider, ReasoningResult, RequestMeta};
use crate::domain::registry::REASONING_PROVIDER_ID;
use crate::domain::DomainError;

/// Reasoning provider reached over HTTP
#[derive(Debug)]
pub struct HttpReasoningProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> HttpReasoningProvider<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn call(&self, endpoint: &str, body: serde_json::Value) -> Result<ReasoningResult, DomainError> {
        let url = self.url(endpoint);
        debug!(provider = REASONING_PROVIDER_ID, url = %url, "Calling reasoning provider");
        let response = self.client.post_json(REASONING_PROVIDER_ID, &url, &body).await?;
        decode(REASONING_PROVIDER_ID, response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> ReasoningProvider for HttpReasoningProvider<C> {
    async fn process_multimodal(
        &self,
        input: &TypedInput,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError> {
        self.call("process", json!({ "input": input, "meta": meta }))
            .await
    }

    async fn process_with_computed_result(
        &self,
        input: &TypedInput,
        computation: &ComputationResult,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError> {
        self.call(
            "process-with-result",
            json!({ "input": input, "computation": computation, "meta": meta }),
        )
        .await
    }

    async fn analyze(
        &self,
        input: &TypedInput,
        prompt: &str,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError> {
        self.call(
            "analyze",
            json!({ "input": input, "prompt": prompt, "meta": meta }),
        )
        .await
    }

    fn name(&self) -> &str {
        REASONING_PROVIDER_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::provider::http_client::mock::MockHttpClient;
    use crate::infrastructure::provider::HttpClient;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_process_multimodal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(body_partial_json(json!({
                "input": {"input_type": "text", "content": "integrate x^2"},
                "meta": {"context_id": "ctx-1", "mode": "answer"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Let me compute that.",
                "contains_math": true,
                "math_query": "integrate(x**2, x)"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpReasoningProvider::new(HttpClient::new(), format!("{}/", server.uri()));
        let result = provider
            .process_multimodal(
                &TypedInput::text("integrate x^2"),
                &RequestMeta::answer("ctx-1", None),
            )
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.contains_math);
        assert_eq!(result.math_query.as_deref(), Some("integrate(x**2, x)"));
    }

    #[tokio::test]
    async fn test_synthesis_sends_computation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process-with-result"))
            .and(body_partial_json(json!({"computation": {"query": "2+2", "result": 4}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "It is 4."})))
            .mount(&server)
            .await;

        let provider = HttpReasoningProvider::new(HttpClient::new(), server.uri());
        let result = provider
            .process_with_computed_result(
                &TypedInput::text("2+2"),
                &ComputationResult::solved("2+2", json!(4)),
                &RequestMeta::answer("ctx-1", None),
            )
            .await
            .unwrap();
        assert_eq!(result.response, "It is 4.");
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = HttpReasoningProvider::new(HttpClient::new(), server.uri());
        let err = provider
            .process_multimodal(&TypedInput::text("hi"), &RequestMeta::answer("ctx", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Provider { ref provider, .. } if provider == REASONING_PROVIDER_ID
        ));
    }

    #[tokio::test]
    async fn test_analyze_sends_prompt() {
        let client = MockHttpClient::new().with_response(
            "http://reasoning/analyze",
            json!({"response": "```json\n{\"operations\": [\"integration\"]}\n```"}),
        );
        let provider = HttpReasoningProvider::new(client, "http://reasoning");

        let result = provider
            .analyze(
                &TypedInput::text("integrate x"),
                "Describe the query",
                &RequestMeta::analysis("ctx-1", None),
            )
            .await
            .unwrap();
        assert!(result.response.contains("integration"));

        let requests = provider.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1["prompt"], "Describe the query");
        assert_eq!(requests[0].1["meta"]["mode"], "analysis");
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let client = MockHttpClient::new()
            .with_response("http://reasoning/process", json!({"response": 42}));
        let provider = HttpReasoningProvider::new(client, "http://reasoning");

        let err = provider
            .process_multimodal(&TypedInput::text("hi"), &RequestMeta::answer("ctx", None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unexpected response shape"));
    }
}
