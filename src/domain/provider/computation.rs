use async_trait::async_trait;
use std::fmt::Debug;

use super::types::{ComputationRequest, ComputationResult};
use crate::domain::DomainError;

/// Symbolic and numerical computation provider (registry id `math_computation_agent`)
#[async_trait]
pub trait ComputationProvider: Send + Sync + Debug {
    async fn compute(&self, request: &ComputationRequest)
    -> Result<ComputationResult, DomainError>;

    fn name(&self) -> &str;
}
