use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::pipeline::{
    ContextEntity, ContextRelation, ContextStore, ConversationContext, RelationKind, StoredEntity,
};
use crate::domain::DomainError;

/// Context store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryContextStore {
    contexts: Arc<RwLock<HashMap<String, ConversationContext>>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn create_context(&self, conversation_id: Option<String>) -> Result<String, DomainError> {
        let id = format!("ctx-{}", uuid::Uuid::new_v4());
        let mut contexts = self.contexts.write().await;
        contexts.insert(id.clone(), ConversationContext::new(&id, conversation_id));
        Ok(id)
    }

    async fn get_context(
        &self,
        context_id: &str,
    ) -> Result<Option<ConversationContext>, DomainError> {
        let contexts = self.contexts.read().await;
        Ok(contexts.get(context_id).cloned())
    }

    async fn add_entity(
        &self,
        context_id: &str,
        entity: ContextEntity,
        kind: &str,
    ) -> Result<String, DomainError> {
        let mut contexts = self.contexts.write().await;
        let context = contexts
            .get_mut(context_id)
            .ok_or_else(|| DomainError::not_found(format!("Context '{}' not found", context_id)))?;

        let id = format!("ent-{}", uuid::Uuid::new_v4());
        context.entities.push(StoredEntity {
            id: id.clone(),
            kind: kind.to_string(),
            entity,
        });
        Ok(id)
    }

    async fn add_relation(
        &self,
        context_id: &str,
        from_id: &str,
        to_id: &str,
        relation: RelationKind,
    ) -> Result<(), DomainError> {
        let mut contexts = self.contexts.write().await;
        let context = contexts
            .get_mut(context_id)
            .ok_or_else(|| DomainError::not_found(format!("Context '{}' not found", context_id)))?;

        for id in [from_id, to_id] {
            if context.entity(id).is_none() {
                return Err(DomainError::validation(format!(
                    "Entity '{}' is not part of context '{}'",
                    id, context_id
                )));
            }
        }

        context.relations.push(ContextRelation {
            from: from_id.to_string(),
            to: to_id.to_string(),
            relation,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::EntityType;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_get_context() {
        let store = InMemoryContextStore::new();
        let id = store.create_context(Some("conv-1".to_string())).await.unwrap();
        assert!(id.starts_with("ctx-"));

        let context = store.get_context(&id).await.unwrap().unwrap();
        assert_eq!(context.conversation_id.as_deref(), Some("conv-1"));
        assert!(context.entities.is_empty());
        assert!(store.get_context("ctx-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entities_and_relation() {
        let store = InMemoryContextStore::new();
        let ctx = store.create_context(None).await.unwrap();

        let input = store
            .add_entity(&ctx, ContextEntity::new(EntityType::Input, json!("2+2")), "text")
            .await
            .unwrap();
        let response = store
            .add_entity(&ctx, ContextEntity::new(EntityType::Response, json!("4")), "text")
            .await
            .unwrap();
        store
            .add_relation(&ctx, &input, &response, RelationKind::ResponseTo)
            .await
            .unwrap();

        let context = store.get_context(&ctx).await.unwrap().unwrap();
        assert_eq!(context.entities.len(), 2);
        assert_eq!(context.relations.len(), 1);
        assert_eq!(context.relations[0].from, input);
        assert_eq!(context.relations[0].to, response);
    }

    #[tokio::test]
    async fn test_add_entity_to_missing_context() {
        let store = InMemoryContextStore::new();
        let result = store
            .add_entity("ctx-missing", ContextEntity::new(EntityType::Input, json!(1)), "text")
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_relation_requires_known_entities() {
        let store = InMemoryContextStore::new();
        let ctx = store.create_context(None).await.unwrap();
        let result = store
            .add_relation(&ctx, "ent-a", "ent-b", RelationKind::ResponseTo)
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
