//! Chat response and token usage types.

use crate::ChatMessage;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A complete (non-streaming) chat response.
///
/// Produced exactly once per non-streaming call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    /// The composite model identifier the request was made with.
    pub model: CompactString,

    /// The assistant message.
    pub message: ChatMessage,

    /// Token usage statistics, absent counters omitted.
    #[serde(default)]
    pub usage: Usage,
}

/// Token usage counters reported by a backend.
///
/// Backends report these inconsistently; any subset may be present. Absent
/// counters are omitted from the wire encoding entirely.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct Usage {
    /// Number of tokens in the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,

    /// Number of tokens in the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,

    /// Total number of tokens used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

impl Usage {
    /// Build usage from backend counters.
    ///
    /// The total is derived whenever at least one counter is present,
    /// treating the missing one as zero.
    pub fn from_counts(prompt: Option<u32>, completion: Option<u32>) -> Self {
        let total = (prompt.is_some() || completion.is_some())
            .then(|| prompt.unwrap_or(0) + completion.unwrap_or(0));
        Self {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: total,
        }
    }

    /// Whether no counter is present.
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_counts_derives_total() {
        let usage = Usage::from_counts(Some(3), Some(2));
        assert_eq!(usage.total_tokens, Some(5));

        let usage = Usage::from_counts(None, Some(2));
        assert_eq!(usage.total_tokens, Some(2));

        assert!(Usage::from_counts(None, None).is_empty());
    }

    #[test]
    fn empty_usage_serializes_to_empty_object() {
        let json = serde_json::to_string(&Usage::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
