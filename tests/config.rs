use workshop_sync::config::Config;
use workshop_sync::constants::{DEFAULT_SYNC_INTERVAL_SECONDS, DEFAULT_TOKEN_ENV};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.site.token_env, DEFAULT_TOKEN_ENV);
    assert_eq!(config.site.timeout_seconds, 30);
    assert_eq!(config.sync.sync_interval_seconds, DEFAULT_SYNC_INTERVAL_SECONDS);
    assert!(config.sync.allow_offline);
    assert!(config.storage.database_path.is_none());
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Site URL needs a scheme
    config.site.url = "moodle.example.org".to_string();
    assert!(config.validate().is_err());

    // Reset and test invalid sync interval
    config.site.url = "https://moodle.example.org/".to_string();
    config.sync.sync_interval_seconds = 100_000;
    assert!(config.validate().is_err());

    config.sync.sync_interval_seconds = 60;
    config.site.timeout_seconds = 0;
    assert!(config.validate().is_err());

    config.site.timeout_seconds = 30;
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("sync_interval_seconds = 300"));
    assert!(toml_str.contains("token_env = \"MOODLE_WS_TOKEN\""));
    assert!(toml_str.contains("timeout_seconds = 30"));
    assert!(!toml_str.contains("user_id"));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[site]
url = "https://school.example.org"

[sync]
allow_offline = false

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.site.url, "https://school.example.org");
    assert!(!config.sync.allow_offline);
    assert!(config.logging.enabled);

    // Check that unspecified values use defaults
    assert_eq!(config.site.token_env, DEFAULT_TOKEN_ENV);
    assert_eq!(config.sync.sync_interval_seconds, 300);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_empty_config_deserialization() {
    // Test that empty TOML uses all defaults
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.site.url, default_config.site.url);
    assert_eq!(
        config.sync.sync_interval_seconds,
        default_config.sync.sync_interval_seconds
    );
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_storage_paths_prefer_configured_values() {
    let mut config = Config::default();
    config.storage.database_path = Some("/tmp/ws/offline.sqlite".into());
    config.storage.files_dir = Some("/tmp/ws/files".into());

    assert_eq!(config.database_path().unwrap(), std::path::PathBuf::from("/tmp/ws/offline.sqlite"));
    assert_eq!(config.files_dir().unwrap(), std::path::PathBuf::from("/tmp/ws/files"));
}

#[test]
fn test_generate_config_creates_directory() {
    use std::fs;

    // Create a temporary path that doesn't exist
    let temp_dir = std::env::temp_dir().join(format!("workshop_sync_test_config_{}", uuid::Uuid::new_v4().simple()));
    let config_path = temp_dir.join("nested").join("config.toml");
    assert!(!temp_dir.exists());

    // Generate config should create the directory structure
    let result = Config::generate_default_config(&config_path);
    assert!(result.is_ok());
    assert!(config_path.exists());

    // Verify the file contains expected content and loads back
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# workshop-sync Configuration File"));
    assert!(content.contains("allow_offline = true"));
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.sync.sync_interval_seconds, 300);

    // Clean up
    let _ = fs::remove_dir_all(&temp_dir);
}
