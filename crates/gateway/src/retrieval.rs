//! Retrieval engine contract.
//!
//! Both operations are best-effort: an empty result set means "no context
//! to inject", never an error the turn should fail on.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// How many document snippets to retrieve per turn.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieval collaborator interface.
pub trait RetrievalEngine: Send + Sync {
    /// Search the web for snippets relevant to the query.
    fn search_web(&self, query: &str) -> impl Future<Output = Vec<String>> + Send;

    /// Retrieve the `top_k` most relevant snippets from the given documents.
    fn retrieve_from_docs(
        &self,
        query: &str,
        doc_ids: &[CompactString],
        top_k: usize,
    ) -> impl Future<Output = Vec<String>> + Send;
}

/// Retrieval engine that never returns context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetrieval;

impl RetrievalEngine for NoRetrieval {
    async fn search_web(&self, _query: &str) -> Vec<String> {
        Vec::new()
    }

    async fn retrieve_from_docs(
        &self,
        _query: &str,
        _doc_ids: &[CompactString],
        _top_k: usize,
    ) -> Vec<String> {
        Vec::new()
    }
}

/// What context a turn asked to have injected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContextOptions {
    /// Search the web with the user message as the query.
    #[serde(default)]
    pub web_search: bool,

    /// Retrieve snippets from these knowledge documents.
    #[serde(default)]
    pub knowledge_ids: Vec<CompactString>,
}

impl ContextOptions {
    /// Whether any retrieval was requested at all.
    pub fn is_empty(&self) -> bool {
        !self.web_search && self.knowledge_ids.is_empty()
    }
}
