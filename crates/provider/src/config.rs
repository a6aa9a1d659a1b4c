//! Provider configuration loaded from TOML.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

/// Top-level provider configuration.
///
/// ```toml
/// [providers.ollama]
/// base_urls = ["http://localhost:11434"]
/// timeout_secs = 60
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Provider configurations keyed by provider name.
    #[serde(default)]
    pub providers: BTreeMap<CompactString, ProviderConfig>,
}

impl ProvidersConfig {
    /// Parse a TOML string, expanding `${ENV_VAR}` references first.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(toml_str);
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Configuration for one provider backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Whether this provider can be resolved at all.
    pub enabled: bool,

    /// Backend kind. When `None`, the provider name itself names the kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderKind>,

    /// Backend base URLs; the first entry is used.
    pub base_urls: Vec<String>,

    /// Deadline for one non-streaming backend call, in seconds.
    pub timeout_secs: u64,

    /// Maximum gap between two units of streamed backend output, in
    /// seconds. Streams carry no overall deadline.
    pub idle_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: None,
            base_urls: Vec::new(),
            timeout_secs: 60,
            idle_timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    /// The configured base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_urls
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Deadline for one non-streaming backend call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Idle deadline for one unit of streamed backend output.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Supported provider backend kinds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Ollama local API.
    Ollama,
    /// Scripted in-process backend for tests.
    #[cfg(feature = "test-utils")]
    Mock,
}

impl ProviderKind {
    /// Infer the backend kind from a provider name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ollama" => Some(Self::Ollama),
            #[cfg(feature = "test-utils")]
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Replace `${VAR}` references with the environment variable's value, or
/// the empty string when unset.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&std::env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
