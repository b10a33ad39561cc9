//! Stage outcomes and the final answer assembled from them

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::pipeline::{InputType, TypedInput};
use crate::domain::provider::{ComputationResult, ReasoningResult, Visualization};

/// Generic response used whenever the reasoning provider cannot answer
pub const DEGRADED_RESPONSE: &str =
    "I'm sorry, I couldn't process your request due to a technical issue.";

const VISUALIZATION_NOTE: &str =
    "\n\nI've created a visualization based on your request. You can view it at: ";

/// Placeholder produced when dispatch to the reasoning provider degrades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedResult {
    pub error: String,
    pub response: String,
    pub input_type: InputType,
    pub original_input: TypedInput,
}

impl DegradedResult {
    pub fn new(error: impl Into<String>, input: &TypedInput) -> Self {
        Self {
            error: error.into(),
            response: DEGRADED_RESPONSE.to_string(),
            input_type: input.input_type,
            original_input: input.clone(),
        }
    }
}

/// Outcome of the provider dispatch stage
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Answer already produced by a recognition stage upstream
    Passthrough(Value),
    Success(ReasoningResult),
    Degraded(DegradedResult),
}

impl DispatchOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn contains_math(&self) -> bool {
        match self {
            Self::Passthrough(value) => value
                .get("contains_math")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Self::Success(result) => result.contains_math,
            Self::Degraded(_) => false,
        }
    }

    pub fn response_text(&self) -> &str {
        match self {
            Self::Passthrough(value) => passthrough_text(value),
            Self::Success(result) => &result.response,
            Self::Degraded(degraded) => &degraded.response,
        }
    }

    /// Query for the computation provider: the explicit math query when the
    /// provider supplied one, otherwise the response text verbatim.
    pub fn computation_query(&self) -> Option<String> {
        let explicit = match self {
            Self::Passthrough(value) => value.get("math_query").and_then(Value::as_str),
            Self::Success(result) => result.math_query.as_deref(),
            Self::Degraded(_) => return None,
        };

        explicit
            .filter(|q| !q.trim().is_empty())
            .or_else(|| Some(self.response_text()).filter(|r| !r.trim().is_empty()))
            .map(str::to_string)
    }

    /// Visualization the dispatch result carries, if any
    pub fn visualization(&self) -> Option<Visualization> {
        match self {
            Self::Passthrough(value) => value
                .get("visualization")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            Self::Success(result) => result.visualization.clone(),
            Self::Degraded(_) => None,
        }
    }

    /// Attach the metadata to a successful reasoning answer when it carries
    /// none yet. The note with the link is only appended when the render has
    /// a URL; a bare file path is not shown to the user.
    /// Returns false when the outcome cannot take an attachment.
    pub fn attach_visualization(&mut self, visualization: &Visualization) -> bool {
        let Self::Success(result) = self else {
            return false;
        };
        if visualization.location().is_none() {
            return false;
        }

        if let Some(url) = visualization.url.as_deref().filter(|u| !u.is_empty()) {
            result.response.push_str(VISUALIZATION_NOTE);
            result.response.push_str(url);
        }
        if result.visualization.is_none() {
            result.visualization = Some(visualization.clone());
        }
        true
    }
}

fn passthrough_text(value: &Value) -> &str {
    ["response", "text", "content"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .or_else(|| value.as_str())
        .unwrap_or("")
}

/// Outcome of the conditional computation stage
#[derive(Debug, Clone, PartialEq)]
pub enum ComputationOutcome {
    NotRequested,
    Unavailable { query: String },
    Completed(ComputationResult),
    Failed(ComputationResult),
}

impl ComputationOutcome {
    /// The result, only when the provider reported success
    pub fn successful(&self) -> Option<&ComputationResult> {
        match self {
            Self::Completed(result) if result.success => Some(result),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ComputationResult> {
        match self {
            Self::Completed(result) | Self::Failed(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_result(self) -> Option<ComputationResult> {
        match self {
            Self::Completed(result) | Self::Failed(result) => Some(result),
            _ => None,
        }
    }
}

/// Which stage produced the final answer text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Dispatch,
    Synthesized,
    RawComputation,
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationSource {
    Computation,
    Dispatch,
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationEntry {
    pub source: VisualizationSource,

    #[serde(flatten)]
    pub visualization: Visualization,
}

impl VisualizationEntry {
    pub fn new(source: VisualizationSource, visualization: Visualization) -> Self {
        Self {
            source,
            visualization,
        }
    }
}

/// Result stored on a completed workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub success: bool,

    pub response: String,

    pub source: AnswerSource,

    #[serde(default)]
    pub contains_math: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computation: Option<ComputationResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visualizations: Vec<VisualizationEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latex_expressions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Raw upstream payload for passthrough and degraded answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl FinalAnswer {
    fn from_reasoning(result: ReasoningResult, source: AnswerSource) -> Self {
        Self {
            success: result.success,
            response: result.response,
            source,
            contains_math: result.contains_math,
            computation: None,
            visualizations: Vec::new(),
            steps: result.steps,
            latex_expressions: result.latex_expressions,
            additional_context: result.additional_context,
            error: result.error,
            payload: None,
        }
    }

    /// Answer carrying the generic apology
    pub fn degraded_placeholder(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: DEGRADED_RESPONSE.to_string(),
            source: AnswerSource::Dispatch,
            contains_math: false,
            computation: None,
            visualizations: Vec::new(),
            steps: Vec::new(),
            latex_expressions: Vec::new(),
            additional_context: None,
            error: Some(error.into()),
            payload: None,
        }
    }

    pub fn from_dispatch(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Passthrough(value) => {
                let mut answer = Self::degraded_placeholder(String::new());
                answer.success = value
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                answer.response = passthrough_text(&value).to_string();
                answer.source = AnswerSource::Passthrough;
                answer.contains_math = value
                    .get("contains_math")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                answer.error = value
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                answer.payload = Some(value);
                answer
            }
            DispatchOutcome::Success(result) => Self::from_reasoning(result, AnswerSource::Dispatch),
            DispatchOutcome::Degraded(degraded) => {
                let mut answer = Self::degraded_placeholder(degraded.error.clone());
                answer.payload = serde_json::to_value(&degraded).ok();
                answer
            }
        }
    }

    /// Answer written by the reasoning provider around a computation result
    pub fn synthesized(result: ReasoningResult) -> Self {
        let mut answer = Self::from_reasoning(result, AnswerSource::Synthesized);
        answer.contains_math = true;
        answer
    }

    /// Answer built from the computation result alone
    pub fn from_computation(computation: &ComputationResult) -> Self {
        Self {
            success: computation.success,
            response: computation.summary(),
            source: AnswerSource::RawComputation,
            contains_math: true,
            computation: None,
            visualizations: Vec::new(),
            steps: computation.steps.clone(),
            latex_expressions: computation.latex_expressions.clone(),
            additional_context: None,
            error: computation.error.clone(),
            payload: None,
        }
    }

    /// Append visualizations in order, skipping any location already present
    pub fn merge_visualizations(&mut self, entries: impl IntoIterator<Item = VisualizationEntry>) {
        for entry in entries {
            let Some(location) = entry.visualization.location() else {
                continue;
            };
            let seen = self
                .visualizations
                .iter()
                .any(|existing| existing.visualization.location() == Some(location));
            if !seen {
                self.visualizations.push(entry);
            }
        }
    }

    pub fn visualization_urls(&self) -> Vec<String> {
        self.visualizations
            .iter()
            .filter_map(|entry| entry.visualization.location())
            .map(str::to_string)
            .collect()
    }
}
