//! Provider adapters and the process-wide provider registry.
//!
//! Each adapter speaks one backend's wire format and normalizes it to the
//! uniform protocol in `moray-llm`; the [`Registry`] maps provider names to
//! live adapter instances, constructing them lazily on first lookup.

pub use config::{ProviderConfig, ProviderKind, ProvidersConfig, expand_env_vars};
pub use http::HttpTransport;
pub use ollama::Ollama;
pub use registry::{Provider, Registry, build_provider};

mod config;
mod http;
mod ollama;
mod registry;
