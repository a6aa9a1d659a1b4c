//! Ollama adapter.
//!
//! Speaks the Ollama HTTP API: `GET /api/tags` for model listing and
//! `POST /api/chat` for generation, where the streaming reply is
//! newline-delimited JSON with a terminal `done: true` line carrying the
//! usage counters.

use crate::{HttpTransport, ProviderConfig};
use async_stream::try_stream;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use llm::{
    ChatError, ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatStreamChunk,
    FinishReason, ModelCapabilities, ModelInfo, ModelParameter, ParameterKind, Result, Role, Usage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const PROVIDER: &str = "ollama";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_CONTEXT_LENGTH: u32 = 4096;

/// Parameter keys forwarded to the backend; everything else is dropped.
const RECOGNIZED_OPTIONS: [&str; 4] = ["temperature", "top_p", "top_k", "max_tokens"];

/// Adapter for an Ollama backend.
#[derive(Clone, Debug)]
pub struct Ollama {
    transport: HttpTransport,
}

impl Ollama {
    /// Create an adapter against the given base URL.
    pub fn new(client: Client, base_url: &str, timeout: Duration, idle_timeout: Duration) -> Self {
        Self {
            transport: HttpTransport::new(client, base_url, timeout, idle_timeout),
        }
    }

    /// Create an adapter from provider configuration.
    pub fn from_config(client: Client, config: &ProviderConfig) -> Self {
        Self::new(
            client,
            config.base_url().unwrap_or(DEFAULT_BASE_URL),
            config.timeout(),
            config.idle_timeout(),
        )
    }

    /// The base URL this adapter targets.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Tunable parameters common to Ollama chat models.
    fn common_parameters() -> BTreeMap<CompactString, ModelParameter> {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            CompactString::const_new("temperature"),
            ModelParameter {
                kind: ParameterKind::Float,
                default: json!(0.7),
                min: Some(json!(0.0)),
                max: Some(json!(2.0)),
                options: None,
                description: Some("Controls randomness: lower is more deterministic".into()),
            },
        );
        parameters.insert(
            CompactString::const_new("top_p"),
            ModelParameter {
                kind: ParameterKind::Float,
                default: json!(1.0),
                min: Some(json!(0.0)),
                max: Some(json!(1.0)),
                options: None,
                description: Some("Nucleus sampling: consider only most likely tokens".into()),
            },
        );
        parameters.insert(
            CompactString::const_new("top_k"),
            ModelParameter {
                kind: ParameterKind::Int,
                default: json!(40),
                min: Some(json!(1)),
                max: Some(json!(100)),
                options: None,
                description: Some("Consider only top k most likely tokens".into()),
            },
        );
        parameters.insert(
            CompactString::const_new("max_tokens"),
            ModelParameter {
                kind: ParameterKind::Int,
                default: json!(2000),
                min: Some(json!(1)),
                max: Some(json!(32000)),
                options: None,
                description: Some("Maximum response length in tokens".into()),
            },
        );
        parameters
    }

    /// Build the `/api/chat` payload, verifying the model prefix and
    /// forwarding only recognized parameter keys.
    fn payload(&self, request: &ChatRequest, stream: bool) -> Result<ChatPayload> {
        let (provider, name) = llm::split_model_id(&request.model)?;
        if provider != PROVIDER {
            return Err(ChatError::InvalidModelId(request.model.clone()));
        }

        let messages = request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let options = request
            .parameters
            .iter()
            .filter(|(key, _)| RECOGNIZED_OPTIONS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(ChatPayload {
            model: name.into(),
            messages,
            options,
            stream,
        })
    }
}

/// `POST /api/chat` request body.
#[derive(Debug, Serialize)]
struct ChatPayload {
    model: CompactString,
    messages: Vec<WireMessage>,
    options: BTreeMap<String, serde_json::Value>,
    stream: bool,
}

/// One message as Ollama expects it. The optional sender name from the
/// uniform protocol has no Ollama equivalent and is not forwarded.
#[derive(Debug, Serialize)]
struct WireMessage {
    role: Role,
    content: String,
}

/// One `/api/chat` reply object, used for both the non-streaming reply and
/// each line of the streaming reply.
#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    message: Option<ReplyMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `GET /api/tags` reply.
#[derive(Debug, Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: CompactString,
    #[serde(default)]
    details: TagDetails,
}

#[derive(Debug, Default, Deserialize)]
struct TagDetails {
    #[serde(default)]
    context_length: Option<u32>,
    #[serde(default)]
    description: Option<String>,
}

impl ChatProvider for Ollama {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn models(&self) -> Vec<ModelInfo> {
        let reply: TagsReply = match self.transport.get_json("/api/tags").await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("failed to list ollama models: {e}");
                return Vec::new();
            }
        };

        reply
            .models
            .into_iter()
            .map(|model| ModelInfo {
                id: CompactString::from(format!("{PROVIDER}/{}", model.name)),
                provider: CompactString::const_new(PROVIDER),
                name: model.name.clone(),
                display_name: display_name(&model.name),
                context_length: model.details.context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH),
                description: model.details.description,
                capabilities: ModelCapabilities {
                    chat: true,
                    function_calling: false,
                    vision: false,
                    embedding: true,
                },
                parameters: Self::common_parameters(),
                available: true,
            })
            .collect()
    }

    async fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let (provider, name) = llm::split_model_id(model_id)?;
        if provider != PROVIDER {
            return Err(ChatError::InvalidModelId(model_id.into()));
        }
        self.models()
            .await
            .into_iter()
            .find(|model| model.name == name)
            .ok_or_else(|| ChatError::UnknownModel(model_id.into()))
    }

    async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let payload = self.payload(request, false)?;
        tracing::debug!(model = %payload.model, "dispatching chat completion");
        let reply: ChatReply = self.transport.post_json("/api/chat", &payload).await?;

        let content = reply
            .message
            .and_then(|m| m.content)
            .unwrap_or_default();
        Ok(ChatResponse {
            model: request.model.clone(),
            message: ChatMessage::assistant(content),
            usage: Usage::from_counts(reply.prompt_eval_count, reply.eval_count),
        })
    }

    fn stream(&self, request: ChatRequest) -> impl Stream<Item = Result<ChatStreamChunk>> + Send {
        let payload = self.payload(&request, true);
        let transport = self.transport.clone();
        let model = request.model.clone();

        try_stream! {
            let payload = payload?;
            tracing::debug!(model = %payload.model, "dispatching streaming chat completion");
            let inner = transport.stream_ndjson::<ChatReply>("/api/chat", &payload);
            let mut inner = std::pin::pin!(inner);

            while let Some(line) = inner.next().await {
                let line = line?;
                if line.done {
                    let mut chunk =
                        ChatStreamChunk::terminal(model.clone(), finish_reason(&line));
                    let usage = Usage::from_counts(line.prompt_eval_count, line.eval_count);
                    if !usage.is_empty() {
                        chunk.usage = Some(usage);
                    }
                    yield chunk;
                    break;
                }
                if let Some(content) = line.message.and_then(|m| m.content) {
                    yield ChatStreamChunk::token(model.clone(), content);
                }
            }
        }
    }

    async fn validate_credentials(&self) -> bool {
        match self.transport.get_json::<TagsReply>("/api/tags").await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("ollama reachability probe failed: {e}");
                false
            }
        }
    }
}

/// Map the terminal line's `done_reason` onto a finish reason.
fn finish_reason(line: &ChatReply) -> FinishReason {
    match line.done_reason.as_deref() {
        Some("length") => FinishReason::Length,
        _ => FinishReason::Stop,
    }
}

/// Uppercase the first character, as the backend offers no display name.
fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> ChatRequest {
        ChatRequest::new(model, vec![ChatMessage::user("hi")])
    }

    #[test]
    fn payload_rejects_foreign_prefix() {
        let ollama = Ollama::new(
            Client::new(),
            DEFAULT_BASE_URL,
            Duration::from_secs(60),
            Duration::from_secs(30),
        );
        let err = ollama.payload(&request("openai/gpt-4"), false).unwrap_err();
        assert!(matches!(err, ChatError::InvalidModelId(_)));
    }

    #[test]
    fn payload_drops_unrecognized_parameters() {
        let ollama = Ollama::new(
            Client::new(),
            DEFAULT_BASE_URL,
            Duration::from_secs(60),
            Duration::from_secs(30),
        );
        let mut req = request("ollama/llama3");
        req.parameters.insert("temperature".into(), json!(0.5));
        req.parameters.insert("frobnicate".into(), json!(true));

        let payload = ollama.payload(&req, false).unwrap();
        assert_eq!(payload.model, "llama3");
        assert_eq!(payload.options.len(), 1);
        assert_eq!(payload.options["temperature"], json!(0.5));
    }

    #[test]
    fn display_name_capitalizes() {
        assert_eq!(display_name("llama3"), "Llama3");
        assert_eq!(display_name(""), "");
    }
}
