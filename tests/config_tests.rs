// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use motion_camera::errors::ConfigError;
use motion_camera::{CaptureProfile, Config};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.threshold, 0.05, "Default threshold should be 0.05");
    assert_eq!(config.tick_interval(), Duration::from_millis(100));
    assert_eq!(config.profile, CaptureProfile::Quick);
    assert!(config.validate().is_ok(), "Defaults should validate");
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = std::env::temp_dir().join(format!("motion-camera-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{"threshold": 0.2, "session_duration_ms": 1500}"#).unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.threshold, 0.2);
    assert_eq!(config.session_duration(), Duration::from_millis(1500));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let path = std::env::temp_dir().join("motion-camera-does-not-exist.json");
    assert!(matches!(Config::load(Some(path.as_path())), Err(ConfigError::Io(_))));
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let dir = std::env::temp_dir().join(format!("motion-camera-bad-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, "{ threshold: ").unwrap();

    assert!(matches!(Config::load(Some(path.as_path())), Err(ConfigError::Parse(_))));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_negative_threshold_fails_validation() {
    let config = Config {
        threshold: -1.0,
        ..Config::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(-1.0)));
}
