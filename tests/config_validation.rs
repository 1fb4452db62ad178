//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use depot_protocol::config::{DepotConfig, StorageConfig};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_config_validates() {
    let config = DepotConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_invalid_server_address() {
    let mut config = DepotConfig::default();
    config.server.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(!errors.is_empty(), "Should have validation errors");
    assert!(errors.iter().any(|e| e.contains("Invalid server address")));
}

#[test]
fn test_empty_server_address() {
    let mut config = DepotConfig::default();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_short_shutdown_timeout() {
    let mut config = DepotConfig::default();
    config.server.shutdown_timeout = Duration::from_millis(100);

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|e| e.contains("Shutdown timeout too short")));
}

#[test]
fn test_repository_and_quarantine_must_differ() {
    let mut config = DepotConfig::default();
    config.storage.quarantine_dir = config.storage.repository_dir.clone();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("must differ")));
}

#[test]
fn test_zero_max_upload_size() {
    let mut config = DepotConfig::default();
    config.storage.max_upload_bytes = 0;

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|e| e.contains("Max upload size must be greater than 0")));
}

#[test]
fn test_excessive_max_upload_size() {
    let mut config = DepotConfig::default();
    config.storage.max_upload_bytes = 10 * 1024 * 1024 * 1024;

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("Max upload size very large")));
}

#[test]
fn test_empty_credential_table_is_flagged() {
    let mut config = DepotConfig::default();
    config.auth.users.clear();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("Credential table is empty")));
}

#[test]
fn test_empty_secret_is_flagged() {
    let mut config = DepotConfig::default();
    config.auth.users.insert("cl9".to_string(), String::new());

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("empty secret")));
}

#[test]
fn test_empty_app_name() {
    let mut config = DepotConfig::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_validate_strict_with_invalid_config() {
    let mut config = DepotConfig::default();
    config.server.address = String::new();

    let result = config.validate_strict();
    assert!(result.is_err());

    if let Err(e) = result {
        assert!(e.to_string().contains("Configuration validation failed"));
    }
}

#[test]
fn test_toml_roundtrip_preserves_layout() {
    let config = DepotConfig::default_with_overrides(|c| {
        c.server.address = "127.0.0.1:9999".to_string();
        c.storage = StorageConfig::under_root("/srv/depot");
    });

    let toml = toml::to_string_pretty(&config).expect("serialize");
    let parsed = DepotConfig::from_toml(&toml).expect("parse");

    assert_eq!(parsed.server.address, "127.0.0.1:9999");
    assert_eq!(parsed.storage.repository_dir, PathBuf::from("/srv/depot/main"));
    assert_eq!(
        parsed.storage.quarantine_dir,
        PathBuf::from("/srv/depot/uploads")
    );
}

#[test]
fn test_example_config_is_loadable_and_valid() {
    let text = DepotConfig::example_config();
    let config = DepotConfig::from_toml(&text).expect("example config parses");
    assert!(config.validate().is_empty());
}

#[test]
fn test_from_toml_rejects_garbage() {
    assert!(DepotConfig::from_toml("not = [valid").is_err());
}

#[test]
fn test_default_credentials_match_demo_accounts() {
    let config = DepotConfig::default();
    assert_eq!(config.auth.users.get("cl1").map(String::as_str), Some("cl1pass"));
    assert_eq!(config.auth.users.get("cl2").map(String::as_str), Some("cl2pass"));
    assert_eq!(config.auth.users.get("cl3").map(String::as_str), Some("cl3pass"));
}
