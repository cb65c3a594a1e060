// Tests for client configuration loading

use std::fs;

use esm_lists::{ClientConfig, ColumnPolicy, Error, ProxyConfig};
use tempfile::TempDir;

#[test]
fn test_load_yaml_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yml");
    fs::write(
        &path,
        r#"
url: https://esm:8443
login: admin
password: secret
verify: false
list_id: YWJjCg==
column_policy: strict
proxies:
  https: http://127.0.0.1:8080
"#,
    )
    .unwrap();

    let config = ClientConfig::load(Some(path.to_str().unwrap())).unwrap();

    assert_eq!(config.url, "https://esm:8443");
    assert_eq!(config.login, "admin");
    assert!(!config.verify);
    assert_eq!(config.list_id.as_deref(), Some("YWJjCg=="));
    assert_eq!(config.column_policy, ColumnPolicy::Strict);
    assert_eq!(
        config.proxies,
        ProxyConfig {
            http: None,
            https: Some("http://127.0.0.1:8080".to_string()),
        }
    );
    assert_eq!(config.logout_timeout_secs, 10);
}

#[test]
fn test_defaults_for_omitted_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yml");
    fs::write(&path, "url: https://esm:8443\n").unwrap();

    let config = ClientConfig::load(Some(path.to_str().unwrap())).unwrap();

    assert!(config.verify);
    assert_eq!(config.column_policy, ColumnPolicy::Lenient);
    assert!(config.list_id.is_none());
}

#[test]
fn test_missing_explicit_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.yml");

    let err = ClientConfig::load(Some(path.to_str().unwrap())).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_invalid_yaml_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yml");
    fs::write(&path, "verify: [not a bool").unwrap();

    let err = ClientConfig::load(Some(path.to_str().unwrap())).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_validate() {
    assert!(ClientConfig::new("https://esm", "admin", "secret").validate().is_ok());
    assert!(ClientConfig::new("", "admin", "secret").validate().is_err());
    assert!(ClientConfig::new("https://esm", "admin", "").validate().is_err());
}

#[test]
fn test_debug_redacts_password() {
    let config = ClientConfig::new("https://esm", "admin", "hunter2");
    let rendered = format!("{:?}", config);

    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("admin"));
}
