//! Scripted in-process provider for tests.
//!
//! [`MockProvider`] plays back a scripted reply, records every invocation,
//! and exposes whether a stream was abandoned before its terminal chunk,
//! the in-process equivalent of observing a connection close on a mock
//! transport.

use crate::{
    ChatError, ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatStreamChunk, FinishReason,
    ModelInfo, Result, Usage,
};
use anyhow::anyhow;
use async_stream::try_stream;
use compact_str::CompactString;
use futures_core::Stream;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// A scripted backend that never touches the network.
#[derive(Clone, Debug)]
pub struct MockProvider {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    name: CompactString,
    chunks: Vec<String>,
    usage: Usage,
    models: Vec<ModelInfo>,
    /// Yield an error after this many content chunks instead of finishing.
    fail_after: Option<usize>,
    generate_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    model_calls: AtomicUsize,
    closed: AtomicBool,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockProvider {
    /// Create a mock with an empty reply.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self::with_reply(name, &[])
    }

    /// Create a mock that replies with the given chunks.
    ///
    /// The non-streaming reply is the concatenation of the chunks.
    pub fn with_reply(name: impl Into<CompactString>, chunks: &[&str]) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
                usage: Usage::default(),
                models: Vec::new(),
                fail_after: None,
                generate_calls: AtomicUsize::new(0),
                stream_calls: AtomicUsize::new(0),
                model_calls: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                last_request: Mutex::new(None),
            }),
        }
    }

    /// Set the usage reported on responses and terminal chunks.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.inner_mut().usage = usage;
        self
    }

    /// Set the advertised model listing.
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.inner_mut().models = models;
        self
    }

    /// Make streams fail with a transport error after `n` content chunks.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.inner_mut().fail_after = Some(n);
        self
    }

    /// Number of `generate` invocations so far.
    pub fn generate_calls(&self) -> usize {
        self.inner.generate_calls.load(Ordering::SeqCst)
    }

    /// Number of `stream` invocations so far.
    pub fn stream_calls(&self) -> usize {
        self.inner.stream_calls.load(Ordering::SeqCst)
    }

    /// Total backend invocations of any kind.
    pub fn total_calls(&self) -> usize {
        self.generate_calls()
            + self.stream_calls()
            + self.inner.model_calls.load(Ordering::SeqCst)
    }

    /// Whether a stream was dropped before its terminal chunk.
    pub fn connection_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// The most recent request this mock received.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.inner.last_request.lock().unwrap().clone()
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::get_mut(&mut self.inner).expect("mock builders run before the mock is shared")
    }

    fn record(&self, request: &ChatRequest) {
        *self.inner.last_request.lock().unwrap() = Some(request.clone());
    }

    fn reply(&self) -> String {
        self.inner.chunks.concat()
    }
}

/// Marks the mock connection closed unless the stream ran to completion.
struct ConnectionGuard {
    inner: Arc<Inner>,
    finished: bool,
}

impl ConnectionGuard {
    fn open(inner: Arc<Inner>) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.inner.closed.store(true, Ordering::SeqCst);
        }
    }
}

impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn models(&self) -> Vec<ModelInfo> {
        self.inner.model_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.models.clone()
    }

    async fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let (provider, name) = crate::split_model_id(model_id)?;
        if provider != self.inner.name {
            return Err(ChatError::InvalidModelId(model_id.into()));
        }
        self.models()
            .await
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ChatError::UnknownModel(model_id.into()))
    }

    async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.inner.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.record(request);
        Ok(ChatResponse {
            model: request.model.clone(),
            message: ChatMessage::assistant(self.reply()),
            usage: self.inner.usage.clone(),
        })
    }

    fn stream(&self, request: ChatRequest) -> impl Stream<Item = Result<ChatStreamChunk>> + Send {
        self.inner.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.record(&request);
        let inner = self.inner.clone();
        try_stream! {
            let guard = ConnectionGuard::open(inner.clone());
            for (index, token) in inner.chunks.iter().enumerate() {
                if inner.fail_after == Some(index) {
                    Err(ChatError::provider(anyhow!("mock transport failure")))?;
                }
                yield ChatStreamChunk::token(request.model.clone(), token.clone());
            }
            if inner.fail_after == Some(inner.chunks.len()) {
                Err(ChatError::provider(anyhow!("mock transport failure")))?;
            }
            let mut terminal = ChatStreamChunk::terminal(request.model.clone(), FinishReason::Stop);
            if !inner.usage.is_empty() {
                terminal.usage = Some(inner.usage.clone());
            }
            yield terminal;
            guard.finish();
        }
    }

    async fn validate_credentials(&self) -> bool {
        true
    }
}
