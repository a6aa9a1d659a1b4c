//! Moray gateway: the chat request lifecycle.
//!
//! The [`Gateway`] drives one turn end to end: resolve the conversation's
//! provider through the registry, assemble the turn context (system
//! prompt, injected retrieval context, bounded history, the new user
//! message), dispatch a non-streaming or streaming generation, and hand
//! structured results back to the caller for persistence. It performs no
//! storage writes of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use moray_gateway::{Gateway, MemoryStore, NoRetrieval, TurnInput};
//! use moray_provider::Registry;
//!
//! let gateway = Gateway::new(Registry::from_config(&config), MemoryStore::new(), NoRetrieval);
//! let conversation = gateway.store().create("ada", "ollama/llama3", None);
//! let output = gateway.send(conversation.id, "ada", TurnInput::new("hello")).await?;
//! ```

pub use context::{HISTORY_WINDOW, assemble, compose_context};
pub use retrieval::{ContextOptions, DEFAULT_TOP_K, NoRetrieval, RetrievalEngine};
pub use store::{Conversation, ConversationStore, MemoryStore, StoredMessage};

use async_stream::try_stream;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use guard::TurnGuards;
use llm::{
    ChatError, ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatStreamChunk,
    FinishReason, ModelInfo, Result,
};
use provider::Registry;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

mod context;
mod guard;
mod retrieval;
mod store;

/// One user turn as the transport layer hands it over.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    /// The new user message.
    pub message: String,
    /// Generation parameters forwarded to the provider.
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Retrieval context to inject, if any.
    pub context: Option<ContextOptions>,
}

impl TurnInput {
    /// A plain turn with no parameters and no retrieval.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parameters: BTreeMap::new(),
            context: None,
        }
    }
}

/// The structured result of a non-streaming turn.
///
/// The gateway returns this to the caller, which persists the user and
/// assistant messages through the conversation store.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    /// The provider response, usage included.
    pub response: ChatResponse,
    /// Whether retrieval context was injected into this turn.
    pub context_injected: bool,
}

/// The chat orchestrator.
///
/// Cheap to clone: clones share the registry, collaborators, and the
/// per-conversation guard set.
pub struct Gateway<S, R> {
    registry: Registry,
    store: Arc<S>,
    retrieval: Arc<R>,
    guards: TurnGuards,
}

impl<S, R> Clone for Gateway<S, R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: Arc::clone(&self.store),
            retrieval: Arc::clone(&self.retrieval),
            guards: self.guards.clone(),
        }
    }
}

impl<S, R> Gateway<S, R>
where
    S: ConversationStore + 'static,
    R: RetrievalEngine + 'static,
{
    /// Create a gateway over a registry and its collaborators.
    pub fn new(registry: Registry, store: S, retrieval: R) -> Self {
        Self {
            registry,
            store: Arc::new(store),
            retrieval: Arc::new(retrieval),
            guards: TurnGuards::default(),
        }
    }

    /// The conversation store, for callers persisting turn results.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The provider registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one non-streaming turn.
    pub async fn send(
        &self,
        conversation_id: Uuid,
        owner: &str,
        input: TurnInput,
    ) -> Result<TurnOutput> {
        let conversation = load(self.store.as_ref(), conversation_id, owner).await?;
        let (provider_name, _) = llm::split_model_id(&conversation.model)?;
        let provider = self.registry.get(provider_name)?;

        let _permit = self.guards.acquire(conversation_id)?;
        let (messages, context_injected) = build_context(
            self.store.as_ref(),
            self.retrieval.as_ref(),
            &conversation,
            &input,
        )
        .await?;

        let request = ChatRequest {
            messages,
            model: conversation.model.clone(),
            parameters: input.parameters,
            stream: false,
        };
        tracing::debug!(model = %request.model, "dispatching turn");
        let response = provider.generate(&request).await?;

        Ok(TurnOutput {
            response,
            context_injected,
        })
    }

    /// Run one streaming turn.
    ///
    /// Chunks are delivered in backend order, one in flight at a time. The
    /// sequence ends with a terminal chunk; a mid-stream transport failure
    /// ends it with a synthetic `finish_reason: error` chunk followed by
    /// the failure itself; tokens already delivered stand. Dropping the
    /// stream cancels the turn: the backend connection closes and the
    /// conversation is released.
    pub fn stream(
        &self,
        conversation_id: Uuid,
        owner: &str,
        input: TurnInput,
    ) -> impl Stream<Item = Result<ChatStreamChunk>> + Send + 'static {
        let registry = self.registry.clone();
        let store = Arc::clone(&self.store);
        let retrieval = Arc::clone(&self.retrieval);
        let guards = self.guards.clone();
        let owner = CompactString::from(owner);

        try_stream! {
            let conversation = load(store.as_ref(), conversation_id, &owner).await?;
            let (provider_name, _) = llm::split_model_id(&conversation.model)?;
            let provider = registry.get(provider_name)?;

            let permit = guards.acquire(conversation_id)?;
            let (messages, _) = build_context(
                store.as_ref(),
                retrieval.as_ref(),
                &conversation,
                &input,
            )
            .await?;

            let model = conversation.model.clone();
            let request = ChatRequest {
                messages,
                model: model.clone(),
                parameters: input.parameters,
                stream: true,
            };
            tracing::debug!(model = %model, "dispatching streaming turn");

            let inner = provider.stream(request);
            let mut inner = std::pin::pin!(inner);
            while let Some(item) = inner.next().await {
                match item {
                    Ok(chunk) => {
                        let terminal = chunk.is_terminal();
                        yield chunk;
                        if terminal {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("stream failed mid-flight: {e}");
                        // Close the sequence before surfacing the failure;
                        // tokens already delivered are not retracted.
                        yield ChatStreamChunk::terminal(model.clone(), FinishReason::Error);
                        Err(e)?;
                    }
                }
            }

            drop(permit);
        }
    }

    /// Aggregate model listings across every resolvable provider.
    pub async fn models(&self) -> Vec<ModelInfo> {
        let mut models = Vec::new();
        for name in self.registry.names() {
            match self.registry.get(&name) {
                Ok(provider) => models.extend(provider.models().await),
                Err(e) => tracing::warn!("skipping provider '{name}': {e}"),
            }
        }
        models
    }

    /// Look up one model by its composite identifier.
    pub async fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let (provider_name, _) = llm::split_model_id(model_id)?;
        let provider = self.registry.get(provider_name)?;
        provider.model_info(model_id).await
    }

    /// Probe whether a provider's backend is reachable.
    pub async fn validate_provider(&self, name: &str) -> Result<bool> {
        let provider = self.registry.get(name)?;
        Ok(provider.validate_credentials().await)
    }
}

/// Fetch a conversation or fail the turn.
async fn load<S: ConversationStore>(
    store: &S,
    conversation_id: Uuid,
    owner: &str,
) -> Result<Conversation> {
    store
        .conversation(conversation_id, owner)
        .await
        .map_err(ChatError::store)?
        .ok_or_else(|| {
            ChatError::ConversationNotFound(CompactString::from(conversation_id.to_string()))
        })
}

/// Gather retrieval context and history, then assemble the message list.
///
/// Retrieval is best-effort; a store failure fails the turn here, before
/// any provider call.
async fn build_context<S: ConversationStore, R: RetrievalEngine>(
    store: &S,
    retrieval: &R,
    conversation: &Conversation,
    input: &TurnInput,
) -> Result<(Vec<ChatMessage>, bool)> {
    let injected = match &input.context {
        Some(options) if !options.is_empty() => {
            let web = if options.web_search {
                retrieval.search_web(&input.message).await
            } else {
                Vec::new()
            };
            let docs = if options.knowledge_ids.is_empty() {
                Vec::new()
            } else {
                retrieval
                    .retrieve_from_docs(&input.message, &options.knowledge_ids, DEFAULT_TOP_K)
                    .await
            };
            compose_context(&web, &docs)
        }
        _ => None,
    };

    let history = store
        .recent_messages(conversation.id, HISTORY_WINDOW)
        .await
        .map_err(ChatError::store)?;

    let messages = assemble(
        conversation.system_prompt.as_deref(),
        injected.as_deref(),
        &history,
        &input.message,
    );
    Ok((messages, injected.is_some()))
}
