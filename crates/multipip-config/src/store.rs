//! Persisted settings shared between the Coordinator and page contexts.
//!
//! The store is the single writer of the settings file. Readers subscribe
//! to a `watch` channel and always see the latest value, whether it came
//! from a toggle here or from an external edit picked up by the
//! [`ReloadManager`](crate::ReloadManager).

use std::path::{Path, PathBuf};

use multipip_common::ConfigError;
use tokio::sync::watch;
use tracing::info;

use crate::reload::ReloadManager;
use crate::schema::MultipipConfig;
use crate::toml_loader;
use crate::toml_writer::save_config_to_path;
use crate::validation;

pub struct SettingsStore {
    path: Option<PathBuf>,
    tx: watch::Sender<MultipipConfig>,
}

impl SettingsStore {
    /// Open the settings file at `path`, creating a documented default if
    /// it does not exist. Out-of-range values are rejected, the same as on
    /// reload.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = match toml_loader::load_from_path(&path) {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => {
                toml_loader::create_default_config(&path)?;
                MultipipConfig::default()
            }
            Err(e) => return Err(e),
        };
        validation::validate(&config)?;
        let (tx, _) = watch::channel(config);
        Ok(Self {
            path: Some(path),
            tx,
        })
    }

    /// A store that never touches disk.
    pub fn in_memory(config: MultipipConfig) -> Self {
        let (tx, _) = watch::channel(config);
        Self { path: None, tx }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> MultipipConfig {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MultipipConfig> {
        self.tx.subscribe()
    }

    /// Follow external edits of the backing file. No-op for in-memory
    /// stores. Must be called inside a tokio runtime.
    pub fn watch_file(&self) {
        if let Some(path) = &self.path {
            ReloadManager::spawn(path.clone(), self.tx.clone());
        }
    }

    pub fn set_multiple_mode(&self, enabled: bool) -> Result<(), ConfigError> {
        let mut next = self.current();
        next.mode.multiple_mode = enabled;
        if let Some(path) = &self.path {
            save_config_to_path(&next, path)?;
        }
        self.tx.send_replace(next);
        info!(enabled, "multiple mode updated");
        Ok(())
    }

    /// Flip `mode.multiple_mode`, persist it, and return the new value.
    pub fn toggle_multiple_mode(&self) -> Result<bool, ConfigError> {
        let enabled = !self.tx.borrow().mode.multiple_mode;
        self.set_multiple_mode(enabled)?;
        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multipip").join("settings.toml");

        let store = SettingsStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(!store.current().mode.multiple_mode);
    }

    #[test]
    fn toggle_persists_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let store = SettingsStore::open(&path).unwrap();
        let rx = store.subscribe();

        assert!(store.toggle_multiple_mode().unwrap());
        assert!(rx.borrow().mode.multiple_mode);

        let reloaded = toml_loader::load_from_path(&path).unwrap();
        assert!(reloaded.mode.multiple_mode);

        assert!(!store.toggle_multiple_mode().unwrap());
        assert!(!rx.borrow().mode.multiple_mode);
    }

    #[test]
    fn open_rejects_gesture_delay_past_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[timing]\ngesture_delay_ms = 5000\n").unwrap();

        let err = SettingsStore::open(&path).err().unwrap();
        match err {
            ConfigError::ValidationError(msg) => {
                assert!(msg.contains("timing.gesture_delay_ms"), "{msg}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn open_accepts_gesture_delay_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[timing]\ngesture_delay_ms = 1000\n").unwrap();

        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.current().timing.gesture_delay_ms, 1000);
    }

    #[test]
    fn in_memory_store_never_writes() {
        let store = SettingsStore::in_memory(MultipipConfig::default());
        assert!(store.path().is_none());
        assert!(store.toggle_multiple_mode().unwrap());
        assert!(store.current().mode.multiple_mode);
    }
}
