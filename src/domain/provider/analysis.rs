//! Structured query analysis extracted from the reasoning provider's analysis mode

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::types::ReasoningResult;
use crate::domain::pipeline::{AgentType, RoutingDecision};

/// Instruction prompt sent with every analysis request
pub const ANALYSIS_PROMPT: &str = "Analyze the mathematical query and identify:
1. Mathematical operations required (symbolic calculation, numerical computation, plotting, etc.)
2. Mathematical concepts involved (algebra, calculus, statistics, etc.)
3. Required specialized agents (math_computation_agent, visualization_agent, search_agent)
4. Complexity level (simple, moderate, complex)
5. Potential sub-problems that could be solved independently
Format your response as a structured JSON object.";

static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Routing decision folded into an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingSummary {
    pub primary_agent_type: AgentType,
    pub confidence: f64,
    pub alternative_agents: Vec<AgentType>,
}

impl From<&RoutingDecision> for RoutingSummary {
    fn from(decision: &RoutingDecision) -> Self {
        Self {
            primary_agent_type: decision.agent_type,
            confidence: decision.confidence,
            alternative_agents: decision.alternative_agents.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryAnalysis {
    #[serde(default)]
    pub operations: Vec<String>,

    #[serde(default)]
    pub concepts: Vec<String>,

    #[serde(default)]
    pub required_agents: Vec<String>,

    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default)]
    pub sub_problems: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingSummary>,
}

impl QueryAnalysis {
    /// Extract an analysis: the structured field first, then a fenced JSON
    /// block in the response, then keyword heuristics over the response.
    pub fn from_reasoning(result: &ReasoningResult) -> Self {
        let structured = result
            .analysis
            .as_ref()
            .filter(|v| !is_empty_value(v))
            .and_then(|v| serde_json::from_value::<Self>(v.clone()).ok());

        match structured {
            Some(analysis) => analysis,
            None => Self::from_response(&result.response),
        }
    }

    pub fn from_response(response: &str) -> Self {
        let Some(block) = JSON_BLOCK.captures(response).and_then(|c| c.get(1)) else {
            return Self::from_keywords(response);
        };

        match serde_json::from_str(block.as_str()) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Malformed analysis JSON block, using default analysis");
                Self::unparseable()
            }
        }
    }

    fn from_keywords(response: &str) -> Self {
        let text = response.to_lowercase();
        let mut analysis = Self::default();

        if text.contains("symbolic") {
            analysis.operations.push("symbolic_calculation".to_string());
        }
        if text.contains("numerical") {
            analysis.operations.push("numerical_computation".to_string());
        }
        if text.contains("plot") || text.contains("graph") {
            analysis.operations.push("plotting".to_string());
            analysis
                .required_agents
                .push("visualization_agent".to_string());
        }
        if text.contains("math") || text.contains("equation") {
            analysis
                .required_agents
                .push("math_computation_agent".to_string());
        }

        analysis
    }

    fn unparseable() -> Self {
        Self {
            required_agents: vec!["core_llm_agent".to_string()],
            ..Self::default()
        }
    }

    pub fn with_routing(mut self, decision: &RoutingDecision) -> Self {
        self.routing = Some(RoutingSummary::from(decision));
        self
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_analysis_wins() {
        let result = ReasoningResult::answer("```json\n{\"complexity\": \"complex\"}\n```")
            .with_analysis(json!({"operations": ["integration"], "complexity": "moderate"}));

        let analysis = QueryAnalysis::from_reasoning(&result);
        assert_eq!(analysis.operations, vec!["integration"]);
        assert_eq!(analysis.complexity, Complexity::Moderate);
    }

    #[test]
    fn test_fenced_json_block() {
        let response = "Here is the analysis:\n```json\n{\"operations\": [\"symbolic_calculation\"], \"concepts\": [\"calculus\"], \"required_agents\": [\"math_computation_agent\"], \"complexity\": \"simple\", \"sub_problems\": []}\n```\nDone.";
        let result = ReasoningResult::answer(response).with_analysis(json!({}));

        let analysis = QueryAnalysis::from_reasoning(&result);
        assert_eq!(analysis.concepts, vec!["calculus"]);
        assert_eq!(analysis.required_agents, vec!["math_computation_agent"]);
        assert_eq!(analysis.complexity, Complexity::Simple);
    }

    #[test]
    fn test_keyword_fallback() {
        let analysis = QueryAnalysis::from_response(
            "This needs a symbolic step, then we plot the equation.",
        );
        assert_eq!(analysis.operations, vec!["symbolic_calculation", "plotting"]);
        assert_eq!(
            analysis.required_agents,
            vec!["visualization_agent", "math_computation_agent"]
        );
        assert_eq!(analysis.complexity, Complexity::Unknown);
    }

    #[test]
    fn test_malformed_block_falls_back_to_core_agent() {
        let analysis = QueryAnalysis::from_response("```json\n{not json\n```");
        assert_eq!(analysis.required_agents, vec!["core_llm_agent"]);
        assert!(analysis.operations.is_empty());
    }

    #[test]
    fn test_unknown_complexity_value() {
        let analysis: QueryAnalysis =
            serde_json::from_value(json!({"complexity": "extreme"})).unwrap();
        assert_eq!(analysis.complexity, Complexity::Unknown);
    }

    #[test]
    fn test_with_routing() {
        let decision = RoutingDecision::new(AgentType::CoreLlm, 0.7)
            .with_alternatives(vec![AgentType::Math]);
        let analysis = QueryAnalysis::default().with_routing(&decision);

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["routing"]["primary_agent_type"], json!("core_llm"));
        assert_eq!(value["routing"]["alternative_agents"], json!(["math"]));
    }
}
