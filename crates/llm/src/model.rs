//! Model descriptors advertised by provider adapters.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about one model a provider can serve.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelInfo {
    /// Composite identifier, `"<provider>/<model-name>"`.
    pub id: CompactString,

    /// Provider name.
    pub provider: CompactString,

    /// Bare model name.
    pub name: CompactString,

    /// Human-readable model name.
    pub display_name: String,

    /// Maximum context length in tokens.
    pub context_length: u32,

    /// Model description, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// What the model can do.
    #[serde(default)]
    pub capabilities: ModelCapabilities,

    /// Tunable generation parameters, keyed by parameter name.
    #[serde(default)]
    pub parameters: BTreeMap<CompactString, ModelParameter>,

    /// Whether the model is currently available.
    #[serde(default = "default_true")]
    pub available: bool,
}

/// Capability flags for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelCapabilities {
    /// Supports chat completion.
    pub chat: bool,
    /// Supports function calling.
    pub function_calling: bool,
    /// Supports image input.
    pub vision: bool,
    /// Supports embeddings.
    pub embedding: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            chat: true,
            function_calling: false,
            vision: false,
            embedding: false,
        }
    }
}

/// The valid domain of one tunable generation parameter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelParameter {
    /// Parameter value type.
    #[serde(rename = "type")]
    pub kind: ParameterKind,

    /// Default value.
    pub default: serde_json::Value,

    /// Minimum value, for numeric parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<serde_json::Value>,

    /// Maximum value, for numeric parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<serde_json::Value>,

    /// Valid options, for enumerated parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<serde_json::Value>>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Value type of a [`ModelParameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Floating point.
    Float,
    /// Integer.
    Int,
    /// Boolean.
    Bool,
    /// Free-form string.
    String,
}

fn default_true() -> bool {
    true
}
