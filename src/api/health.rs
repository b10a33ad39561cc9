//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::registry::{
    COMPUTATION_PROVIDER_ID, REASONING_PROVIDER_ID, VISUALIZATION_PROVIDER_ID,
};
use crate::infrastructure::workflow::ProviderAvailability;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Availability of one provider
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    fn provider(name: &str, available: bool) -> Self {
        Self {
            name: name.to_string(),
            status: if available {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            message: (!available).then(|| "provider not registered or unreachable".to_string()),
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness with provider availability. Missing providers degrade answers
/// but the service still accepts requests.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let availability = state.engine.provider_availability().await;

    let response = readiness(availability, start.elapsed().as_millis() as u64);
    (StatusCode::OK, Json(response))
}

fn readiness(availability: ProviderAvailability, latency_ms: u64) -> HealthResponse {
    let checks = vec![
        HealthCheck::provider(REASONING_PROVIDER_ID, availability.reasoning),
        HealthCheck::provider(COMPUTATION_PROVIDER_ID, availability.computation),
        HealthCheck::provider(VISUALIZATION_PROVIDER_ID, availability.visualization),
    ];

    HealthResponse {
        status: if availability.all_available() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(latency_ms),
    }
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
