//! Content routing contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::input::TypedInput;
use crate::domain::DomainError;

/// Provider family a piece of content is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    #[default]
    CoreLlm,
    Ocr,
    AdvancedOcr,
    Math,
    Visualization,
    #[serde(other)]
    Unknown,
}

impl AgentType {
    /// Recognition agents run inside the input pipeline and may already carry an answer
    pub fn is_recognition(&self) -> bool {
        matches!(self, Self::Ocr | Self::AdvancedOcr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreLlm => "core_llm",
            Self::Ocr => "ocr",
            Self::AdvancedOcr => "advanced_ocr",
            Self::Math => "math",
            Self::Visualization => "visualization",
            Self::Unknown => "unknown",
        }
    }
}

/// Classification produced by the content router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    #[serde(default)]
    pub agent_type: AgentType,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub alternative_agents: Vec<AgentType>,

    /// Answer produced upstream by a recognition stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl RoutingDecision {
    pub fn new(agent_type: AgentType, confidence: f64) -> Self {
        Self {
            agent_type,
            confidence,
            alternative_agents: Vec::new(),
            result: None,
        }
    }

    /// Fallback used when the router fails or is not confident
    pub fn default_reasoning() -> Self {
        Self::new(AgentType::CoreLlm, 0.0)
    }

    pub fn with_alternatives(mut self, alternatives: Vec<AgentType>) -> Self {
        self.alternative_agents = alternatives;
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// The upstream answer, when this decision is already terminal
    pub fn terminal_result(&self) -> Option<&Value> {
        if self.agent_type.is_recognition() {
            self.result.as_ref()
        } else {
            None
        }
    }
}

/// Decides which provider family handles a typed input
#[async_trait]
pub trait ContentRouter: Send + Sync {
    async fn route(&self, input: &TypedInput) -> Result<RoutingDecision, DomainError>;
}
