//! Tests for the bitclock configuration system.

use std::sync::Mutex;
use std::time::Duration;

use bitclock_core::config::{ClientConfig, ConfigStore};
use bitclock_core::errors::ConfigError;
use bitclock_core::models::Source;
use serde_json::json;

/// Serializes tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_bitclock_env_vars() {
    for key in [
        "BITCLOCK_ENABLE",
        "BITCLOCK_DEBUG",
        "BITCLOCK_ENV",
        "BITCLOCK_BUCKET",
        "BITCLOCK_MAX_CHUNK_SIZE",
        "BITCLOCK_REPORTING_INTERVAL_MS",
        "BITCLOCK_REPORTING_ENDPOINT",
        "BITCLOCK_REPORTING_API_VERSION",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_defaults() {
    let config = ClientConfig::default();
    assert!(config.enable);
    assert!(!config.debug);
    assert_eq!(config.bucket, None);
    assert_eq!(config.max_chunk_size, 200);
    assert_eq!(config.reporting_interval(), Duration::from_millis(5_000));
    assert_eq!(config.reporting_endpoint, "https://hub.bitclock.io");
    assert_eq!(config.source, Source::Server);
    ClientConfig::validate(&config).unwrap();
}

#[test]
fn test_env_overrides_project_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_bitclock_env_vars();

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bitclock.toml"),
        r#"
bucket = "file-bucket"
max_chunk_size = 100
reporting_interval_ms = 1000
"#,
    )
    .unwrap();
    std::env::set_var("BITCLOCK_MAX_CHUNK_SIZE", "300");
    std::env::set_var("BITCLOCK_ENV", "staging");

    let config = ClientConfig::load(dir.path()).unwrap();
    assert_eq!(config.bucket.as_deref(), Some("file-bucket"));
    assert_eq!(config.max_chunk_size, 300);
    assert_eq!(config.reporting_interval_ms, 1000);
    assert_eq!(config.env.as_deref(), Some("staging"));

    clear_bitclock_env_vars();
}

#[test]
fn test_load_without_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_bitclock_env_vars();

    let dir = tempfile::TempDir::new().unwrap();
    let config = ClientConfig::load(dir.path()).unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn test_load_file_missing_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = ClientConfig::load_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_bitclock_env_vars();

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("bitclock.toml"), "this is not valid toml {{{{").unwrap();
    match ClientConfig::load(dir.path()).unwrap_err() {
        ConfigError::ParseError { .. } => {}
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_out_of_range_file_values_rejected() {
    let err = ClientConfig::from_toml("max_chunk_size = 5000").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { ref field, .. } if field == "max_chunk_size"));

    let err = ClientConfig::from_toml("reporting_interval_ms = 1").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { ref field, .. } if field == "reporting_interval_ms"));
}

#[test]
fn test_recommended_band_only_warns() {
    // 200 ms is below the recommended band but inside the hard bounds.
    let config = ClientConfig::from_toml("reporting_interval_ms = 200\nmax_chunk_size = 5").unwrap();
    assert_eq!(config.reporting_interval_ms, 200);
    assert_eq!(config.max_chunk_size, 5);
}

#[test]
fn test_toml_roundtrip() {
    let config = ClientConfig::from_toml(
        r#"
bucket = "b"
source = "client"
user_agent = "agent/1.0"
"#,
    )
    .unwrap();
    let text = config.to_toml().unwrap();
    let back = ClientConfig::from_toml(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_event_url() {
    let mut config = ClientConfig::default();
    assert_eq!(config.event_url(), None);

    config.bucket = Some("cc6e1624".into());
    config.reporting_endpoint = "http://localhost:3000/".into();
    assert_eq!(
        config.event_url().as_deref(),
        Some("http://localhost:3000/v0/bucket/cc6e1624/event")
    );
}

#[test]
fn test_store_rejects_out_of_range_and_keeps_value() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    assert!(store.set_max_chunk_size(0).is_err());
    assert!(store.set_max_chunk_size(1001).is_err());
    assert_eq!(store.max_chunk_size(), 200);

    store.set_max_chunk_size(10).unwrap();
    assert_eq!(store.max_chunk_size(), 10);
}

#[test]
fn test_store_key_value_set() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    store.set("bucket", json!("cc6e1624-5b2c")).unwrap();
    store.set("reportingInterval", json!(200)).unwrap();
    store.set("source", json!("client")).unwrap();

    let config = store.snapshot();
    assert_eq!(config.bucket.as_deref(), Some("cc6e1624-5b2c"));
    assert_eq!(config.reporting_interval_ms, 200);
    assert_eq!(config.source, Source::Client);
}

#[test]
fn test_store_structural_errors() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    for bad in [json!(null), json!(300.5), json!("300"), json!(-5)] {
        let err = store.set("reportingInterval", bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err:?}");
    }
    let err = store.set("reportingInterval", json!(1)).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
    assert!(matches!(
        store.set("nope", json!(1)).unwrap_err(),
        ConfigError::UnknownKey { .. }
    ));
    assert_eq!(store.snapshot().reporting_interval_ms, 5_000);
}

#[test]
fn test_store_reset_and_token_revision() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    let rev = store.token_revision();

    store.set_bucket(Some("b".into()));
    assert_eq!(store.token_revision(), rev);

    store.set_token(Some("t".into()));
    assert!(store.token_revision() > rev);

    let rev = store.token_revision();
    store.reset();
    assert!(store.token_revision() > rev);
    assert_eq!(store.snapshot(), ClientConfig::default());
}

#[test]
fn test_store_clones_share_state() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    let other = store.clone();
    other.set_enable(false);
    assert!(!store.enabled());
}

#[test]
fn test_replace_validates() {
    let store = ConfigStore::new(ClientConfig::default()).unwrap();
    let bad = ClientConfig {
        request_timeout_ms: 0,
        ..Default::default()
    };
    assert!(store.replace(bad).is_err());
    assert_eq!(store.snapshot().request_timeout_ms, 10_000);
}
