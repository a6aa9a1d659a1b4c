//! Error taxonomy shared across the gateway and provider adapters.

use compact_str::CompactString;
use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = ChatError> = std::result::Result<T, E>;

/// Failures a chat turn can surface to its caller.
///
/// `StreamDecode` is special: a single malformed unit inside a stream is
/// recovered locally (logged and skipped) and never terminates the stream,
/// so callers normally only observe it in logs.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The model's provider prefix does not name a configured provider, or
    /// the provider is disabled.
    #[error("provider '{0}' is not available")]
    ProviderUnavailable(CompactString),

    /// The model identifier is malformed or its prefix does not match the
    /// adapter it was routed to. Fails fast, the backend is never contacted.
    #[error("invalid model id '{0}', expected '<provider>/<model>'")]
    InvalidModelId(CompactString),

    /// The bare model name is not present in the backend's listing.
    #[error("model '{0}' not found")]
    UnknownModel(CompactString),

    /// The backend returned a transport or status failure.
    #[error("provider request failed: {0}")]
    Provider(#[source] anyhow::Error),

    /// One malformed unit inside an otherwise healthy stream.
    #[error("malformed stream payload: {0}")]
    StreamDecode(String),

    /// Another generation is already in flight for this conversation.
    #[error("conversation '{0}' already has a generation in flight")]
    ConversationBusy(CompactString),

    /// The conversation does not exist for this owner.
    #[error("conversation '{0}' not found")]
    ConversationNotFound(CompactString),

    /// A conversation store call failed before the provider was contacted.
    #[error("conversation store failure: {0}")]
    Store(#[source] anyhow::Error),
}

impl ChatError {
    /// Wrap a transport/status failure from a backend call.
    pub fn provider(err: impl Into<anyhow::Error>) -> Self {
        Self::Provider(err.into())
    }

    /// Wrap a conversation store failure.
    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Self::Store(err.into())
    }
}
