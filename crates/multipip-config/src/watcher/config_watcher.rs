//! Core settings file watcher implementation.
//!
//! Contains the [`ConfigWatcher`] struct that monitors the settings file
//! for changes using the `notify` crate, with debounced notifications.

use multipip_common::ConfigError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a settings file for changes and sends notifications.
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new watcher for the given settings file path.
    pub fn new(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "settings file {} does not exist yet, will watch for creation",
                path.display()
            );
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Watch the settings file, sending `()` on `tx` after each change.
    ///
    /// Runs until the notify backend goes away. Editors that save with
    /// write + rename produce several events; they collapse into one
    /// signal within a 500ms window.
    pub async fn watch(&self, tx: broadcast::Sender<()>) -> Result<(), ConfigError> {
        let watch_path = match self.path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.path.clone(),
        };

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        info!("starting settings watcher for {}", self.path.display());

        // Bridges the sync notify callback into async
        let (notify_tx, mut notify_rx) = tokio::sync::mpsc::channel::<()>(16);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }

                    let is_our_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false));

                    if is_our_file {
                        debug!("settings file change detected");
                        let _ = notify_tx.try_send(());
                    }
                }
                Err(e) => {
                    error!("file watcher error: {e}");
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| ConfigError::WatchError(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::WatchError(format!("failed to watch {}: {e}", watch_path.display()))
            })?;

        loop {
            if notify_rx.recv().await.is_none() {
                break;
            }

            let debounce = tokio::time::sleep(DEBOUNCE);
            tokio::pin!(debounce);

            loop {
                tokio::select! {
                    _ = &mut debounce => break,
                    msg = notify_rx.recv() => {
                        if msg.is_none() {
                            return Ok(());
                        }
                    }
                }
            }

            info!("settings file changed, sending reload signal");
            if tx.send(()).is_err() {
                debug!("no receivers for settings reload signal");
            }
        }

        drop(watcher);
        Ok(())
    }
}
