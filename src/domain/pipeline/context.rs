//! Conversational context store contract

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// What an entity in a context represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Input,
    Response,
    QueryAnalysis,
}

/// Entity recorded in a conversation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntity {
    pub entity_type: EntityType,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
}

impl ContextEntity {
    pub fn new(entity_type: EntityType, content: Value) -> Self {
        Self {
            entity_type,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Relation between two entities of the same context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ResponseTo,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseTo => write!(f, "response_to"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub id: String,
    pub kind: String,
    pub entity: ContextEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRelation {
    pub from: String,
    pub to: String,
    pub relation: RelationKind,
}

/// A conversation context with its entities and relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub entities: Vec<StoredEntity>,
    pub relations: Vec<ContextRelation>,
    pub created_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(id: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            conversation_id,
            entities: Vec::new(),
            relations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn entity(&self, id: &str) -> Option<&StoredEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Long-term store for conversation contexts
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Create a context, returning its identifier
    async fn create_context(&self, conversation_id: Option<String>) -> Result<String, DomainError>;

    async fn get_context(&self, context_id: &str)
    -> Result<Option<ConversationContext>, DomainError>;

    /// Add an entity, returning its identifier
    async fn add_entity(
        &self,
        context_id: &str,
        entity: ContextEntity,
        kind: &str,
    ) -> Result<String, DomainError>;

    async fn add_relation(
        &self,
        context_id: &str,
        from_id: &str,
        to_id: &str,
        relation: RelationKind,
    ) -> Result<(), DomainError>;
}
