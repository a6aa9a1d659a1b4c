//! Tests for the provider registry.

use compact_str::CompactString;
use llm::ChatError;
use moray_provider::{Ollama, Provider, ProviderConfig, Registry};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn ollama_configs() -> BTreeMap<CompactString, ProviderConfig> {
    let mut configs = BTreeMap::new();
    configs.insert(CompactString::const_new("ollama"), ProviderConfig::default());
    configs
}

#[test]
fn get_caches_the_adapter_instance() {
    let registry = Registry::new(ollama_configs());
    let first = registry.get("ollama").unwrap();
    let second = registry.get("ollama").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unknown_name_is_unavailable() {
    let registry = Registry::new(ollama_configs());
    let err = registry.get("ghost").unwrap_err();
    assert!(matches!(err, ChatError::ProviderUnavailable(_)));
}

#[test]
fn disabled_provider_is_unavailable() {
    let mut configs = ollama_configs();
    configs.get_mut("ollama").unwrap().enabled = false;
    let registry = Registry::new(configs);
    let err = registry.get("ollama").unwrap_err();
    assert!(matches!(err, ChatError::ProviderUnavailable(_)));
}

#[test]
fn config_without_known_kind_is_unavailable() {
    let mut configs = BTreeMap::new();
    configs.insert(CompactString::const_new("ghost"), ProviderConfig::default());
    let registry = Registry::new(configs);
    assert!(matches!(
        registry.get("ghost"),
        Err(ChatError::ProviderUnavailable(_))
    ));
}

#[test]
fn reload_replaces_instances() {
    let registry = Registry::new(ollama_configs());
    let before = registry.get("ollama").unwrap();

    registry.reload(ollama_configs());
    let after = registry.get("ollama").unwrap();
    // Replace-not-mutate: a reload yields a fresh instance.
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn reload_can_remove_providers() {
    let registry = Registry::new(ollama_configs());
    registry.get("ollama").unwrap();

    registry.reload(BTreeMap::new());
    assert!(matches!(
        registry.get("ollama"),
        Err(ChatError::ProviderUnavailable(_))
    ));
}

#[test]
fn injected_adapters_resolve_and_list() {
    let registry = Registry::new(BTreeMap::new());
    let adapter = Ollama::new(
        reqwest::Client::new(),
        "http://localhost:11434",
        Duration::from_secs(60),
        Duration::from_secs(30),
    );
    registry.insert("local", Provider::Ollama(adapter));

    assert!(registry.get("local").is_ok());
    assert_eq!(registry.names(), vec![CompactString::const_new("local")]);
}

#[test]
fn names_lists_enabled_configs() {
    let mut configs = ollama_configs();
    configs.insert(
        CompactString::const_new("backup"),
        ProviderConfig {
            enabled: false,
            ..ProviderConfig::default()
        },
    );
    let registry = Registry::new(configs);
    assert_eq!(registry.names(), vec![CompactString::const_new("ollama")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_lookups_build_one_instance() {
    let registry = Registry::new(ollama_configs());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move { registry.get("ollama").unwrap() }));
    }

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.unwrap());
    }
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}
