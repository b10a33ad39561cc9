//! Typed input and the input normalization contract

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Kind of content a typed input carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    Latex,
    Image,
    Handwriting,
    Multipart,
    #[serde(other)]
    Other,
}

impl InputType {
    /// Only plain text is eligible for visualization intent analysis
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Latex => "latex",
            Self::Image => "image",
            Self::Handwriting => "handwriting",
            Self::Multipart => "multipart",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized representation of a caller's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedInput {
    pub input_type: InputType,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl TypedInput {
    pub fn new(input_type: InputType, content: impl Into<String>) -> Self {
        Self {
            input_type,
            content: content.into(),
            metadata: Value::Null,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(InputType::Text, content)
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Textual content, if this input is plain text and non-empty
    pub fn text_content(&self) -> Option<&str> {
        if self.input_type.is_textual() && !self.content.trim().is_empty() {
            Some(&self.content)
        } else {
            None
        }
    }
}

/// Turns raw content into a typed input
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InputNormalizer: Send + Sync {
    /// Fails with `DomainError::InvalidInput` when the content cannot be typed
    async fn process(&self, content: &str, content_type: &str) -> Result<TypedInput, DomainError>;
}
