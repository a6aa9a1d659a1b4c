//! Unified chat protocol types and the provider contract.
//!
//! This crate provides the shared vocabulary exchanged between the
//! gateway, the provider registry, and the concrete backend adapters:
//! `ChatMessage`, `ChatRequest`, `ChatResponse`, `ChatStreamChunk`,
//! `ModelInfo`, the `ChatProvider` trait, and the `ChatError` taxonomy.
//!
//! The `test-utils` feature exposes [`MockProvider`], a scripted in-process
//! backend used by the gateway and registry test suites.

pub use error::{ChatError, Result};
pub use message::{ChatMessage, Role};
#[cfg(feature = "test-utils")]
pub use mock::MockProvider;
pub use model::{ModelCapabilities, ModelInfo, ModelParameter, ParameterKind};
pub use provider::ChatProvider;
pub use request::{ChatRequest, split_model_id};
pub use response::{ChatResponse, Usage};
pub use stream::{ChatStreamChunk, FinishReason, TurnBuilder};

mod error;
mod message;
#[cfg(feature = "test-utils")]
mod mock;
mod model;
mod provider;
mod request;
mod response;
mod stream;
