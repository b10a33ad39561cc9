//! Pipeline collaborators
//!
//! Narrow contracts for the services the workflow engine consumes but does
//! not own:
//! - input normalization (raw content to typed input)
//! - content routing (which provider a piece of content belongs to)
//! - the conversational context store

mod context;
mod input;
mod routing;

pub use context::{
    ContextEntity, ContextRelation, ContextStore, ConversationContext, EntityType, RelationKind,
    StoredEntity,
};
pub use input::{InputNormalizer, InputType, TypedInput};
pub use routing::{AgentType, ContentRouter, RoutingDecision};

#[cfg(test)]
pub use context::MockContextStore;
#[cfg(test)]
pub use input::MockInputNormalizer;
