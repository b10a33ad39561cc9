//! API error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::workflow::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    ConflictError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } | DomainError::InvalidInput { message } => {
                Self::bad_request(message)
            }
            DomainError::Provider { .. } | DomainError::ProviderUnavailable { .. } => {
                Self::unavailable(err.to_string())
            }
            DomainError::Persistence { message }
            | DomainError::Configuration { message }
            | DomainError::Internal { message } => Self::internal(message),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::NotFound(_) => Self::not_found(err.to_string()),
            WorkflowError::NotCompleted { state, .. } => {
                Self::conflict(err.to_string()).with_code(format!("workflow_{}", state))
            }
            WorkflowError::InvalidId(_) | WorkflowError::InvalidInput(_) => {
                Self::bad_request(err.to_string())
            }
            WorkflowError::Conflict(_) => Self::conflict(err.to_string()),
            WorkflowError::Timeout { .. } => Self::unavailable(err.to_string()),
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::Engine(_)
            | WorkflowError::Cancelled => Self::internal(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::WorkflowState;

    #[test]
    fn test_workflow_error_statuses() {
        let not_found: ApiError = WorkflowError::not_found("wf-1").into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let running: ApiError = WorkflowError::not_completed("wf-1", WorkflowState::Processing).into();
        assert_eq!(running.status, StatusCode::CONFLICT);
        assert_eq!(running.response.error.code.as_deref(), Some("workflow_processing"));

        let invalid: ApiError = WorkflowError::invalid_input("empty").into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let engine: ApiError = WorkflowError::engine("boom").into();
        assert_eq!(engine.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_error_conversion() {
        let api_err: ApiError = DomainError::invalid_input("unsupported content type").into();
        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);

        let api_err: ApiError = DomainError::provider_unavailable("core_llm_agent").into();
        assert_eq!(api_err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::ServiceUnavailableError);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::not_found("Workflow not found: wf-1");
        let json = serde_json::to_value(&err.response).unwrap();
        assert_eq!(json["error"]["type"], "not_found_error");
        assert_eq!(json["error"]["message"], "Workflow not found: wf-1");
        assert!(json["error"].get("code").is_none());
    }
}
