use async_trait::async_trait;

use crate::domain::pipeline::{AgentType, ContentRouter, RoutingDecision, TypedInput};
use crate::domain::DomainError;

const MATH_TERMS: &[&str] = &[
    "integral",
    "integrate",
    "derivative",
    "differentiate",
    "solve",
    "equation",
    "limit",
    "sum",
    "matrix",
    "factor",
    "simplify",
    "expand",
    "calculate",
    "compute",
    "evaluate",
    "sqrt",
    "log",
    "sin",
    "cos",
    "tan",
];

const PLOT_TERMS: &[&str] = &[
    "plot",
    "graph",
    "chart",
    "draw",
    "visualize",
    "visualise",
    "sketch",
    "histogram",
    "scatter",
];

/// Lexical router: every textual input goes to the core reasoning provider,
/// with math and visualization providers listed as alternatives when their
/// vocabulary appears in the text.
#[derive(Debug, Clone, Default)]
pub struct KeywordContentRouter;

impl KeywordContentRouter {
    pub fn new() -> Self {
        Self
    }
}

fn tokenize(input: &str) -> Vec<String> {
    input
        .to_ascii_lowercase()
        .replace('\'', "")
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn score(tokens: &[String], vocabulary: &[&str]) -> usize {
    tokens
        .iter()
        .filter(|token| vocabulary.contains(&token.as_str()))
        .count()
}

fn confidence(signal: usize) -> f64 {
    (0.6 + 0.1 * signal as f64).min(0.95)
}

#[async_trait]
impl ContentRouter for KeywordContentRouter {
    async fn route(&self, input: &TypedInput) -> Result<RoutingDecision, DomainError> {
        let Some(text) = input.text_content() else {
            return Ok(RoutingDecision::new(AgentType::CoreLlm, 0.5));
        };

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(RoutingDecision::default_reasoning());
        }

        let math = score(&tokens, MATH_TERMS);
        let plot = score(&tokens, PLOT_TERMS);

        let mut alternatives = vec![(AgentType::Math, math), (AgentType::Visualization, plot)];
        alternatives.retain(|(_, hits)| *hits > 0);
        alternatives.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(RoutingDecision::new(AgentType::CoreLlm, confidence(math + plot))
            .with_alternatives(alternatives.into_iter().map(|(agent, _)| agent).collect()))
    }
}
