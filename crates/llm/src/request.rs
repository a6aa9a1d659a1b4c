//! Chat request type and model identifier handling.

use crate::{ChatError, ChatMessage, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A uniform chat request dispatched to a provider adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Composite model identifier, `"<provider>/<model-name>"`.
    pub model: CompactString,

    /// Tunable generation parameters. Adapters forward only the keys they
    /// recognize and silently drop the rest.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,

    /// Whether the response should be streamed.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a non-streaming request with no parameters.
    pub fn new(model: impl Into<CompactString>, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: model.into(),
            parameters: BTreeMap::new(),
            stream: false,
        }
    }

    /// The provider prefix of the model identifier.
    pub fn provider(&self) -> Result<&str> {
        split_model_id(&self.model).map(|(provider, _)| provider)
    }

    /// The bare model name, without the provider prefix.
    pub fn model_name(&self) -> Result<&str> {
        split_model_id(&self.model).map(|(_, name)| name)
    }
}

/// Split a composite model identifier into `(provider, model-name)`.
///
/// Fails with [`ChatError::InvalidModelId`] when either side of the `/`
/// is missing.
pub fn split_model_id(model: &str) -> Result<(&str, &str)> {
    model
        .split_once('/')
        .filter(|(provider, name)| !provider.is_empty() && !name.is_empty())
        .ok_or_else(|| ChatError::InvalidModelId(model.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_accepts_composite_ids() {
        assert_eq!(split_model_id("ollama/llama3").unwrap(), ("ollama", "llama3"));
        // Only the first separator splits, model names may contain slashes.
        assert_eq!(
            split_model_id("ollama/library/llama3").unwrap(),
            ("ollama", "library/llama3")
        );
    }

    #[test]
    fn split_rejects_bare_names() {
        assert!(matches!(
            split_model_id("llama3"),
            Err(ChatError::InvalidModelId(_))
        ));
        assert!(matches!(
            split_model_id("/llama3"),
            Err(ChatError::InvalidModelId(_))
        ));
        assert!(matches!(
            split_model_id("ollama/"),
            Err(ChatError::InvalidModelId(_))
        ));
    }
}
