//! Integration tests for logging initialization
//!
//! A global subscriber can only be installed once per process, so only one
//! test here is allowed to initialize logging successfully.

use lapps_export::config::LoggingConfig;
use lapps_export::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let result = init_logging("verbose", &LoggingConfig::default());
    let err = result.err().unwrap();
    assert!(err.to_string().contains("verbose"));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_invalid_rotation_is_rejected_before_install() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "weekly".to_string(),
    };

    let result = init_logging("info", &config);
    assert!(result.is_err());
    assert!(!log_path.exists());
}

#[test]
fn test_file_logging_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("info", &config).unwrap();
    tracing::info!(target: "lapps_export", site_id = 42, "page exported");
    drop(guard);

    let contents = std::fs::read_to_string(log_path.join("lapps-export.log")).unwrap();
    let line = contents
        .lines()
        .find(|l| l.contains("page exported"))
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["fields"]["site_id"], 42);
    assert_eq!(event["level"], "INFO");
}
