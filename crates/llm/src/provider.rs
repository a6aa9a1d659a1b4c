//! The provider adapter contract.

use crate::{ChatRequest, ChatResponse, ChatStreamChunk, ModelInfo, Result};
use futures_core::Stream;

/// The capability set every backend adapter implements.
///
/// An adapter translates the uniform chat protocol to and from one
/// backend's wire format. Adapters are cheap to clone; callers never hold
/// a registry lock across an adapter call.
pub trait ChatProvider: Sized + Clone {
    /// The provider prefix this adapter answers to (e.g. `"ollama"`).
    fn name(&self) -> &str;

    /// List the models the backend currently serves.
    ///
    /// Best-effort: transport failures are logged and yield an empty list
    /// rather than failing the caller.
    fn models(&self) -> impl Future<Output = Vec<ModelInfo>> + Send;

    /// Look up one model by its composite identifier.
    ///
    /// Fails with `InvalidModelId` when the prefix does not match this
    /// adapter, or `UnknownModel` when the bare name is absent from the
    /// backend listing.
    fn model_info(&self, model_id: &str) -> impl Future<Output = Result<ModelInfo>> + Send;

    /// Perform one non-streaming generation call.
    ///
    /// Only recognized parameter keys are forwarded to the backend. Any
    /// transport or status failure surfaces as `Provider`; a partial
    /// response is never returned.
    fn generate(&self, request: &ChatRequest) -> impl Future<Output = Result<ChatResponse>> + Send;

    /// Perform one streaming generation call.
    ///
    /// The returned stream is lazy, finite, and non-restartable: each
    /// chunk is delivered before more backend data is requested, and the
    /// sequence ends when the backend signals completion or the connection
    /// closes. Malformed individual units are skipped, not fatal.
    fn stream(&self, request: ChatRequest) -> impl Stream<Item = Result<ChatStreamChunk>> + Send;

    /// Probe whether the backend is reachable with the configured
    /// credentials. Never errors; any failure yields `false`.
    fn validate_credentials(&self) -> impl Future<Output = bool> + Send;
}
