//! Tests for the reload manager.

use super::*;
use multipip_common::ConfigError;
use std::path::PathBuf;

#[test]
fn reload_of_missing_file_fails() {
    let manager = ReloadManager::new(PathBuf::from("/tmp/nonexistent_multipip_reload_test.toml"));
    let err = manager.reload_config().unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn reload_picks_up_valid_edit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        r#"
[mode]
multiple_mode = true
"#,
    )
    .unwrap();

    let config = ReloadManager::new(path).reload_config().unwrap();
    assert!(config.mode.multiple_mode);
    assert_eq!(config.overlay.width, 320);
}

#[test]
fn reload_rejects_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[timing]\ngesture_delay_ms = 5000\n").unwrap();

    let err = ReloadManager::new(path).reload_config().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}
