//! Request and result types exchanged with capability providers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::pipeline::InputType;

fn default_true() -> bool {
    true
}

/// How the reasoning provider should treat a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    #[default]
    Answer,
    Analysis,
}

/// Metadata sent alongside every reasoning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RequestMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    #[serde(default)]
    pub mode: RequestMode,
}

impl RequestMeta {
    pub fn answer(context_id: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            conversation_id,
            context_id: Some(context_id.into()),
            mode: RequestMode::Answer,
        }
    }

    pub fn analysis(context_id: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            mode: RequestMode::Analysis,
            ..Self::answer(context_id, conversation_id)
        }
    }
}

/// A rendered visualization reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Visualization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<String>,
}

impl Visualization {
    /// Where the visualization can be found: the URL, else the file path
    pub fn location(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.file_path.as_deref())
            .filter(|l| !l.is_empty())
    }
}

/// Result returned by the reasoning provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    #[serde(default = "default_true")]
    pub success: bool,

    #[serde(default)]
    pub response: String,

    #[serde(default)]
    pub contains_math: bool,

    /// Explicit query for the computation provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latex_expressions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Value>,

    /// Structured analysis, only in analysis mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReasoningResult {
    pub fn answer(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            contains_math: false,
            math_query: None,
            visualization: None,
            steps: Vec::new(),
            latex_expressions: Vec::new(),
            additional_context: None,
            analysis: None,
            error: None,
        }
    }

    pub fn with_math(mut self, math_query: Option<String>) -> Self {
        self.contains_math = true;
        self.math_query = math_query;
        self
    }

    pub fn with_visualization(mut self, visualization: Visualization) -> Self {
        self.visualization = Some(visualization);
        self
    }

    pub fn with_steps(mut self, steps: Vec<Value>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_latex(mut self, latex_expressions: Vec<String>) -> Self {
        self.latex_expressions = latex_expressions;
        self
    }

    pub fn with_analysis(mut self, analysis: Value) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::answer(String::new())
        }
    }

    /// Reported success with something to show the user
    pub fn has_answer(&self) -> bool {
        self.success && !self.response.trim().is_empty()
    }
}

/// Message sent to the computation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRequest {
    pub query: String,
    pub input_type: InputType,
    pub requires_explanation: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ComputationRequest {
    pub fn new(
        query: impl Into<String>,
        input_type: InputType,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            query: query.into(),
            input_type,
            requires_explanation: true,
            conversation_id,
        }
    }
}

/// Result returned by the computation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    #[serde(default = "default_true")]
    pub success: bool,

    #[serde(default)]
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latex_expressions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComputationResult {
    pub fn solved(query: impl Into<String>, result: Value) -> Self {
        Self {
            success: true,
            query: query.into(),
            result: Some(result),
            explanation: None,
            steps: Vec::new(),
            latex_expressions: Vec::new(),
            visualization: None,
            error: None,
        }
    }

    /// Failure placeholder carrying the triggering error
    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            ..Self::solved(query, Value::Null)
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_visualization(mut self, visualization: Visualization) -> Self {
        self.visualization = Some(visualization);
        self
    }

    /// Human-readable rendering used when no synthesis is possible
    pub fn summary(&self) -> String {
        if let Some(explanation) = self.explanation.as_deref().filter(|e| !e.is_empty()) {
            return explanation.to_string();
        }
        match &self.result {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Whether a piece of text asks for a visualization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VisualizationIntent {
    #[serde(default)]
    pub is_request: bool,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<String>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

impl VisualizationIntent {
    pub fn request(plot_type: impl Into<String>, confidence: f64) -> Self {
        Self {
            is_request: true,
            confidence,
            plot_type: Some(plot_type.into()),
            parameters: Value::Null,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_confident(&self, min_confidence: f64) -> bool {
        self.is_request && self.confidence >= min_confidence
    }
}

/// Result of rendering a visualization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RenderedVisualization {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderedVisualization {
    pub fn rendered(file_path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            success: true,
            file_path: Some(file_path.into()),
            url: Some(url.into()),
            error: None,
        }
    }

    /// The visualization, if rendering succeeded and produced a location
    pub fn into_visualization(self, plot_type: Option<String>) -> Option<Visualization> {
        if !self.success {
            return None;
        }
        let visualization = Visualization {
            file_path: self.file_path,
            url: self.url,
            plot_type,
        };
        visualization.location().is_some().then_some(visualization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_has_no_answer() {
        let result: ReasoningResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.success);
        assert!(!result.has_answer());

        assert!(!ReasoningResult::answer("   ").has_answer());
        assert!(!ReasoningResult::failed("boom").has_answer());
        assert!(ReasoningResult::answer("4").has_answer());
    }

    #[test]
    fn test_reasoning_result_defaults_to_success() {
        let result: ReasoningResult =
            serde_json::from_value(json!({"response": "42"})).unwrap();
        assert!(result.success);
        assert!(!result.contains_math);
        assert!(result.math_query.is_none());
    }

    #[test]
    fn test_computation_request_requires_explanation() {
        let request = ComputationRequest::new("integrate x^2", InputType::Text, None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["requires_explanation"], json!(true));
        assert_eq!(value["input_type"], json!("text"));
        assert!(value.get("conversation_id").is_none());
    }

    #[test]
    fn test_computation_failure() {
        let result = ComputationResult::failure("x^2", "engine offline");
        assert!(!result.success);
        assert_eq!(result.query, "x^2");
        assert_eq!(result.error.as_deref(), Some("engine offline"));
        assert!(result.result.is_none());
    }

    #[test]
    fn test_computation_summary() {
        let explained = ComputationResult::solved("x", json!("x^3/3")).with_explanation("Power rule");
        assert_eq!(explained.summary(), "Power rule");

        let plain = ComputationResult::solved("x", json!("x^3/3"));
        assert_eq!(plain.summary(), "x^3/3");

        let numeric = ComputationResult::solved("x", json!(4));
        assert_eq!(numeric.summary(), "4");
    }

    #[test]
    fn test_visualization_location_prefers_url() {
        let viz = Visualization {
            file_path: Some("/tmp/a.png".to_string()),
            url: Some("http://viz/a.png".to_string()),
            plot_type: None,
        };
        assert_eq!(viz.location(), Some("http://viz/a.png"));

        let file_only = Visualization {
            file_path: Some("/tmp/a.png".to_string()),
            ..Default::default()
        };
        assert_eq!(file_only.location(), Some("/tmp/a.png"));
        assert_eq!(Visualization::default().location(), None);
    }

    #[test]
    fn test_intent_confidence_threshold() {
        assert!(VisualizationIntent::request("function_2d", 0.8).is_confident(0.5));
        assert!(VisualizationIntent::request("function_2d", 0.5).is_confident(0.5));
        assert!(!VisualizationIntent::request("function_2d", 0.4).is_confident(0.5));
        assert!(!VisualizationIntent::none().is_confident(0.0));
    }

    #[test]
    fn test_rendered_visualization() {
        let ok = RenderedVisualization::rendered("/tmp/p.png", "http://viz/p.png");
        let viz = ok.into_visualization(Some("function_2d".to_string())).unwrap();
        assert_eq!(viz.url.as_deref(), Some("http://viz/p.png"));

        let failed = RenderedVisualization {
            success: false,
            error: Some("bad expression".to_string()),
            ..Default::default()
        };
        assert!(failed.into_visualization(None).is_none());

        let empty = RenderedVisualization {
            success: true,
            ..Default::default()
        };
        assert!(empty.into_visualization(None).is_none());
    }
}
