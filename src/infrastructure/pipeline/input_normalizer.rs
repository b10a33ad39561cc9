use async_trait::async_trait;
use serde_json::json;

use crate::domain::pipeline::{InputNormalizer, InputType, TypedInput};
use crate::domain::DomainError;

/// Types raw content from its MIME content type
#[derive(Debug, Clone, Default)]
pub struct ContentTypeInputNormalizer;

impl ContentTypeInputNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn input_type_for(content_type: &str) -> Option<InputType> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" | "text/plain" | "text/markdown" => Some(InputType::Text),
            "text/x-latex" | "application/x-latex" => Some(InputType::Latex),
            m if m.starts_with("image/") => Some(InputType::Image),
            _ => None,
        }
    }
}

#[async_trait]
impl InputNormalizer for ContentTypeInputNormalizer {
    async fn process(&self, content: &str, content_type: &str) -> Result<TypedInput, DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::invalid_input("content cannot be empty"));
        }

        let input_type = Self::input_type_for(content_type).ok_or_else(|| {
            DomainError::invalid_input(format!("unsupported content type '{}'", content_type))
        })?;

        Ok(TypedInput::new(input_type, content).with_metadata(json!({
            "content_type": content_type,
        })))
    }
}
