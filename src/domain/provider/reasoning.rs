use async_trait::async_trait;
use std::fmt::Debug;

use super::types::{ComputationResult, ReasoningResult, RequestMeta};
use crate::domain::pipeline::TypedInput;
use crate::domain::DomainError;

/// General reasoning provider (registry id `core_llm_agent`)
#[async_trait]
pub trait ReasoningProvider: Send + Sync + Debug {
    /// Answer a typed input
    async fn process_multimodal(
        &self,
        input: &TypedInput,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError>;

    /// Turn a computation result into a user-facing answer
    async fn process_with_computed_result(
        &self,
        input: &TypedInput,
        computation: &ComputationResult,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError>;

    /// Run the analysis mode with an explicit instruction prompt
    async fn analyze(
        &self,
        input: &TypedInput,
        prompt: &str,
        meta: &RequestMeta,
    ) -> Result<ReasoningResult, DomainError>;

    fn name(&self) -> &str;
}
