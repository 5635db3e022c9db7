// tests/config_test.rs
use serial_test::serial;
use spec_ledger::config::{load_config, Config, TAG_PREFIX_ENV};
use spec_ledger::SpecLedgerError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.versioning.tag_prefix, "v");
    assert!(config.versioning.auto_commit);
    assert!(config.versioning.auto_tag);
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[versioning]
tag_prefix = "spec-v"
auto_commit = false

[project]
spec_file = "api.spec.yaml"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.versioning.tag_prefix, "spec-v");
    assert!(!config.versioning.auto_commit);
    assert!(config.versioning.auto_tag);
    assert_eq!(config.project.spec_file.as_deref(), Some("api.spec.yaml"));
}

#[test]
fn test_invalid_file_is_config_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[versioning\ntag_prefix = ").unwrap();
    temp_file.flush().unwrap();

    let result = load_config(Some(temp_file.path().to_str().unwrap()));
    assert!(matches!(result, Err(SpecLedgerError::Config(_))));
}

#[test]
fn test_missing_explicit_file_is_error() {
    let result = load_config(Some("/definitely/not/here/specledger.toml"));
    assert!(matches!(result, Err(SpecLedgerError::Config(_))));
}

#[test]
#[serial]
fn test_tag_prefix_from_config() {
    std::env::remove_var(TAG_PREFIX_ENV);
    let mut config = Config::default();
    config.versioning.tag_prefix = "release-".to_string();
    assert_eq!(config.tag_pattern().prefix, "release-");
}

#[test]
#[serial]
fn test_tag_prefix_env_override() {
    std::env::set_var(TAG_PREFIX_ENV, "spec/");
    let pattern = Config::default().tag_pattern();
    std::env::remove_var(TAG_PREFIX_ENV);

    assert_eq!(pattern.prefix, "spec/");
}
