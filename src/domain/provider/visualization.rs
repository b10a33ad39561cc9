use async_trait::async_trait;
use std::fmt::Debug;

use super::types::{RenderedVisualization, VisualizationIntent};
use crate::domain::DomainError;

/// Plot rendering provider (registry id `visualization_agent`)
#[async_trait]
pub trait VisualizationProvider: Send + Sync + Debug {
    /// Decide whether free text asks for a plot
    async fn analyze_intent(&self, text: &str) -> Result<VisualizationIntent, DomainError>;

    async fn render(&self, intent: &VisualizationIntent)
    -> Result<RenderedVisualization, DomainError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    pub struct MockVisualizationProvider {
        intent: VisualizationIntent,
        rendered: Option<RenderedVisualization>,
        intent_error: Option<String>,
        render_error: Option<String>,
        renders: AtomicUsize,
    }

    impl MockVisualizationProvider {
        pub fn new() -> Self {
            Self {
                intent: VisualizationIntent::none(),
                rendered: None,
                intent_error: None,
                render_error: None,
                renders: AtomicUsize::new(0),
            }
        }

        pub fn with_intent(mut self, intent: VisualizationIntent) -> Self {
            self.intent = intent;
            self
        }

        pub fn with_render(mut self, rendered: RenderedVisualization) -> Self {
            self.rendered = Some(rendered);
            self
        }

        pub fn with_intent_error(mut self, error: impl Into<String>) -> Self {
            self.intent_error = Some(error.into());
            self
        }

        pub fn with_render_error(mut self, error: impl Into<String>) -> Self {
            self.render_error = Some(error.into());
            self
        }

        pub fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    impl Default for MockVisualizationProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl VisualizationProvider for MockVisualizationProvider {
        async fn analyze_intent(&self, _text: &str) -> Result<VisualizationIntent, DomainError> {
            if let Some(ref error) = self.intent_error {
                return Err(DomainError::provider("visualization_agent", error));
            }
            Ok(self.intent.clone())
        }

        async fn render(
            &self,
            _intent: &VisualizationIntent,
        ) -> Result<RenderedVisualization, DomainError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if let Some(ref error) = self.render_error {
                return Err(DomainError::provider("visualization_agent", error));
            }
            self.rendered.clone().ok_or_else(|| {
                DomainError::provider("visualization_agent", "No mock render configured")
            })
        }

        fn name(&self) -> &str {
            "visualization_agent"
        }
    }
}
