use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InputProcessing,
    AmbiguityChecking,
    ContentRouting,
    AgentProcessing,
    VisualizationCheck,
    MathematicalProcessing,
    ResponseGeneration,
    ContextPersistence,
    Finalization,
}

impl Stage {
    pub const PIPELINE: [Stage; 9] = [
        Stage::InputProcessing,
        Stage::AmbiguityChecking,
        Stage::ContentRouting,
        Stage::AgentProcessing,
        Stage::VisualizationCheck,
        Stage::MathematicalProcessing,
        Stage::ResponseGeneration,
        Stage::ContextPersistence,
        Stage::Finalization,
    ];

    /// Step name recorded on the workflow
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputProcessing => "input_processing",
            Self::AmbiguityChecking => "ambiguity_checking",
            Self::ContentRouting => "content_routing",
            Self::AgentProcessing => "agent_processing",
            Self::VisualizationCheck => "visualization_check",
            Self::MathematicalProcessing => "mathematical_processing",
            Self::ResponseGeneration => "response_generation",
            Self::ContextPersistence => "context_persistence",
            Self::Finalization => "finalization",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InputProcessing => "Processing input",
            Self::AmbiguityChecking => "Checking for ambiguities",
            Self::ContentRouting => "Routing content to appropriate agents",
            Self::AgentProcessing => "Processing with specialized agents",
            Self::VisualizationCheck => "Checking if visualization is needed",
            Self::MathematicalProcessing => "Processing mathematical content",
            Self::ResponseGeneration => "Generating final response",
            Self::ContextPersistence => "Storing interaction in context",
            Self::Finalization => "Finalizing workflow",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_stage_names_are_unique() {
        let names: HashSet<_> = Stage::PIPELINE.iter().map(Stage::name).collect();
        assert_eq!(names.len(), Stage::PIPELINE.len());
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(Stage::PIPELINE.first(), Some(&Stage::InputProcessing));
        assert_eq!(Stage::PIPELINE.last(), Some(&Stage::Finalization));
    }

    #[test]
    fn test_serde_matches_name() {
        for stage in Stage::PIPELINE {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.name()));
        }
    }
}
