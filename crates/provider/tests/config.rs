//! Tests for provider configuration loading.

use moray_provider::{ProviderKind, ProvidersConfig, expand_env_vars};

#[test]
fn parses_provider_table() {
    let config = ProvidersConfig::from_toml(
        r#"
        [providers.ollama]
        base_urls = ["http://localhost:11434"]
        timeout_secs = 120
        "#,
    )
    .unwrap();

    let ollama = &config.providers["ollama"];
    assert!(ollama.enabled);
    assert_eq!(ollama.base_url(), Some("http://localhost:11434"));
    assert_eq!(ollama.timeout().as_secs(), 120);
    assert_eq!(ollama.idle_timeout().as_secs(), 30);
}

#[test]
fn defaults_apply_to_empty_entries() {
    let config = ProvidersConfig::from_toml("[providers.ollama]\n").unwrap();
    let ollama = &config.providers["ollama"];
    assert!(ollama.enabled);
    assert_eq!(ollama.base_url(), None);
    assert_eq!(ollama.timeout().as_secs(), 60);
}

#[test]
fn empty_config_has_no_providers() {
    let config = ProvidersConfig::from_toml("").unwrap();
    assert!(config.providers.is_empty());
}

#[test]
fn disabled_flag_round_trips() {
    let config = ProvidersConfig::from_toml(
        r#"
        [providers.ollama]
        enabled = false
        "#,
    )
    .unwrap();
    assert!(!config.providers["ollama"].enabled);
}

#[test]
fn expands_env_vars_in_toml() {
    // SAFETY: single mutation of a test-only variable; no thread depends
    // on its absence.
    unsafe { std::env::set_var("MORAY_TEST_BASE_URL", "http://10.0.0.7:11434") };
    let config = ProvidersConfig::from_toml(
        r#"
        [providers.ollama]
        base_urls = ["${MORAY_TEST_BASE_URL}"]
        "#,
    )
    .unwrap();
    assert_eq!(
        config.providers["ollama"].base_url(),
        Some("http://10.0.0.7:11434")
    );
}

#[test]
fn unset_env_vars_expand_to_empty() {
    assert_eq!(expand_env_vars("a ${MORAY_TEST_UNSET_VAR} b"), "a  b");
    assert_eq!(expand_env_vars("no placeholders"), "no placeholders");
    // An unterminated placeholder is left as-is.
    assert_eq!(expand_env_vars("broken ${VAR"), "broken ${VAR");
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.toml");
    std::fs::write(&path, "[providers.ollama]\ntimeout_secs = 5\n").unwrap();

    let config = ProvidersConfig::load(&path).unwrap();
    assert_eq!(config.providers["ollama"].timeout().as_secs(), 5);
}

#[test]
fn kind_inferred_from_name() {
    assert_eq!(ProviderKind::from_name("ollama"), Some(ProviderKind::Ollama));
    assert_eq!(ProviderKind::from_name("ghost"), None);
}
