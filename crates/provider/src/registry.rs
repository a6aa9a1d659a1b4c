//! Provider registry: the process-wide name to adapter map.
//!
//! Adapters are constructed lazily on first lookup and cached for the
//! process lifetime. Configuration reload replaces entries wholesale, it
//! never mutates a live adapter.

use crate::{Ollama, ProviderConfig, ProviderKind, ProvidersConfig};
use async_stream::try_stream;
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::StreamExt;
use llm::{
    ChatError, ChatProvider, ChatRequest, ChatResponse, ChatStreamChunk, ModelInfo, Result,
};
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

/// Unified provider enum with enum dispatch over concrete backends.
#[derive(Clone, Debug)]
pub enum Provider {
    /// Ollama local API.
    Ollama(Ollama),
    /// Scripted in-process backend for tests.
    #[cfg(feature = "test-utils")]
    Mock(llm::MockProvider),
}

/// Construct a provider from config and a shared HTTP client.
pub fn build_provider(name: &str, config: &ProviderConfig, client: Client) -> Result<Provider> {
    let kind = config
        .kind
        .or_else(|| ProviderKind::from_name(name))
        .ok_or_else(|| ChatError::ProviderUnavailable(name.into()))?;

    let provider = match kind {
        ProviderKind::Ollama => Provider::Ollama(Ollama::from_config(client, config)),
        #[cfg(feature = "test-utils")]
        ProviderKind::Mock => Provider::Mock(llm::MockProvider::new(name)),
    };
    Ok(provider)
}

impl ChatProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Self::Ollama(p) => p.name(),
            #[cfg(feature = "test-utils")]
            Self::Mock(p) => p.name(),
        }
    }

    async fn models(&self) -> Vec<ModelInfo> {
        match self {
            Self::Ollama(p) => p.models().await,
            #[cfg(feature = "test-utils")]
            Self::Mock(p) => p.models().await,
        }
    }

    async fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        match self {
            Self::Ollama(p) => p.model_info(model_id).await,
            #[cfg(feature = "test-utils")]
            Self::Mock(p) => p.model_info(model_id).await,
        }
    }

    async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse> {
        match self {
            Self::Ollama(p) => p.generate(request).await,
            #[cfg(feature = "test-utils")]
            Self::Mock(p) => p.generate(request).await,
        }
    }

    fn stream(&self, request: ChatRequest) -> impl Stream<Item = Result<ChatStreamChunk>> + Send {
        let this = self.clone();
        try_stream! {
            match this {
                Provider::Ollama(p) => {
                    let mut stream = std::pin::pin!(p.stream(request));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
                #[cfg(feature = "test-utils")]
                Provider::Mock(p) => {
                    let mut stream = std::pin::pin!(p.stream(request));
                    while let Some(chunk) = stream.next().await {
                        yield chunk?;
                    }
                }
            }
        }
    }

    async fn validate_credentials(&self) -> bool {
        match self {
            Self::Ollama(p) => p.validate_credentials().await,
            #[cfg(feature = "test-utils")]
            Self::Mock(p) => p.validate_credentials().await,
        }
    }
}

/// Process-wide registry of named provider adapters.
///
/// Cheap to clone; clones share the same underlying map. Lookups never
/// hold the lock across an adapter call; callers receive an `Arc` to the
/// live instance.
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    /// Provider configurations keyed by name.
    configs: BTreeMap<CompactString, ProviderConfig>,
    /// Live adapter instances, constructed on first lookup.
    providers: BTreeMap<CompactString, Arc<Provider>>,
    /// Shared HTTP client for constructing adapters.
    client: Client,
}

impl Registry {
    /// Create a registry from a named map of provider configs.
    ///
    /// No adapter is constructed until its name is first looked up.
    pub fn new(configs: BTreeMap<CompactString, ProviderConfig>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                configs,
                providers: BTreeMap::new(),
                client: Client::new(),
            })),
        }
    }

    /// Create a registry from loaded configuration.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        Self::new(config.providers.clone())
    }

    /// Resolve a provider name to its live adapter, constructing and
    /// caching it on first use.
    ///
    /// Unknown or disabled names fail with `ProviderUnavailable`.
    pub fn get(&self, name: &str) -> Result<Arc<Provider>> {
        {
            let inner = self.inner.read().expect("registry lock poisoned");
            if let Some(provider) = inner.providers.get(name) {
                return Ok(provider.clone());
            }
        }

        let mut inner = self.inner.write().expect("registry lock poisoned");
        // Re-check: a concurrent first lookup may have constructed the
        // adapter between the read and write locks.
        if let Some(provider) = inner.providers.get(name) {
            return Ok(provider.clone());
        }

        let config = inner
            .configs
            .get(name)
            .filter(|config| config.enabled)
            .cloned()
            .ok_or_else(|| ChatError::ProviderUnavailable(name.into()))?;
        let provider = Arc::new(build_provider(name, &config, inner.client.clone())?);
        inner.providers.insert(name.into(), provider.clone());
        Ok(provider)
    }

    /// Inject a pre-built adapter under the given name, replacing any
    /// existing entry.
    pub fn insert(&self, name: impl Into<CompactString>, provider: Provider) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner.providers.insert(name.into(), Arc::new(provider));
    }

    /// Replace the configuration table and drop every built adapter.
    ///
    /// Subsequent lookups reconstruct adapters from the new configs; no
    /// process restart is required.
    pub fn reload(&self, configs: BTreeMap<CompactString, ProviderConfig>) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner.configs = configs;
        inner.providers.clear();
    }

    /// Names that can currently be resolved: enabled configs plus any
    /// injected adapters.
    pub fn names(&self) -> Vec<CompactString> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let names: BTreeSet<CompactString> = inner
            .configs
            .iter()
            .filter(|(_, config)| config.enabled)
            .map(|(name, _)| name.clone())
            .chain(inner.providers.keys().cloned())
            .collect();
        names.into_iter().collect()
    }
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("registry lock poisoned");
        f.debug_struct("Registry")
            .field("configured", &inner.configs.len())
            .field("built", &inner.providers.len())
            .finish()
    }
}
