//! Default pipeline collaborators
//!
//! Small, self-contained implementations so the service runs without external
//! collaborators. Replace them through the service registry.

mod content_router;
mod context_store;
mod input_normalizer;

pub use content_router::KeywordContentRouter;
pub use context_store::InMemoryContextStore;
pub use input_normalizer::ContentTypeInputNormalizer;
