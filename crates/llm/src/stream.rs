//! Streaming chunk type and turn accumulation.

use crate::{ChatMessage, Usage};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One incremental unit of a streamed model response.
///
/// A well-formed stream is an ordered sequence of chunks with
/// `finish_reason: null` except the final chunk, which carries a terminal
/// reason. Concatenating the `token` fields in order yields the content the
/// equivalent non-streaming call would have returned.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ChatStreamChunk {
    /// The composite model identifier the request was made with.
    pub model: CompactString,

    /// The incremental text.
    pub token: String,

    /// Terminal reason, `null` on every chunk but the last.
    pub finish_reason: Option<FinishReason>,

    /// Usage counters for backends that report them only on the terminal
    /// unit. Internal to the process, never serialized.
    #[serde(skip)]
    pub usage: Option<Usage>,
}

impl ChatStreamChunk {
    /// Create a content chunk.
    pub fn token(model: impl Into<CompactString>, token: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            token: token.into(),
            finish_reason: None,
            usage: None,
        }
    }

    /// Create a terminal chunk with an empty token.
    pub fn terminal(model: impl Into<CompactString>, reason: FinishReason) -> Self {
        Self {
            model: model.into(),
            token: String::new(),
            finish_reason: Some(reason),
            usage: None,
        }
    }

    /// Whether this chunk carries a terminal reason.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// Frame this chunk as one text event stream event, `data: <json>\n\n`.
    pub fn to_sse(&self) -> String {
        // All fields serialize infallibly (strings and unit enums).
        let json = serde_json::to_string(self).expect("chunk serialization is infallible");
        format!("data: {json}\n\n")
    }
}

/// Why a stream terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model finished naturally.
    Stop,
    /// The model hit the token limit.
    Length,
    /// The stream failed mid-flight; delivered tokens remain valid.
    Error,
}

/// Accumulates a chunk sequence into the final assistant message.
///
/// Callers feed every chunk they receive through [`TurnBuilder::accept`]
/// and read back the assistant message plus whatever usage the backend
/// reported on the terminal unit, so a streamed turn can be persisted
/// exactly like a non-streaming one.
#[derive(Debug, Default)]
pub struct TurnBuilder {
    content: String,
    usage: Usage,
    finish: Option<FinishReason>,
}

impl TurnBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one chunk from the stream.
    pub fn accept(&mut self, chunk: &ChatStreamChunk) {
        self.content.push_str(&chunk.token);
        if let Some(usage) = &chunk.usage {
            self.usage = usage.clone();
        }
        if chunk.finish_reason.is_some() {
            self.finish = chunk.finish_reason;
        }
    }

    /// The terminal reason observed so far, if any.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish
    }

    /// Whether a terminal chunk has been accepted.
    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    /// Build the accumulated assistant message and usage.
    pub fn build(self) -> (ChatMessage, Usage) {
        (ChatMessage::assistant(self.content), self.usage)
    }
}
