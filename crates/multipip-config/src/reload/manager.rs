//! Core reload manager implementation.

use crate::schema::MultipipConfig;
use crate::toml_loader;
use crate::validation;
use crate::watcher::ConfigWatcher;
use multipip_common::ConfigError;
use std::path::PathBuf;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

/// Manages live settings reloading.
///
/// Watches the settings file and publishes new values through a
/// [`tokio::sync::watch`] channel.
pub struct ReloadManager {
    config_path: PathBuf,
}

impl ReloadManager {
    pub(super) fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Spawn the watch loop, publishing reloaded settings into `config_tx`.
    pub fn spawn(config_path: PathBuf, config_tx: watch::Sender<MultipipConfig>) {
        tokio::spawn(async move {
            Self::new(config_path).run_watch_loop(config_tx).await;
        });
    }

    async fn run_watch_loop(&self, config_tx: watch::Sender<MultipipConfig>) {
        let watcher = match ConfigWatcher::new(self.config_path.clone()) {
            Ok(w) => w,
            Err(e) => {
                error!("failed to create settings watcher: {e}");
                return;
            }
        };

        let (change_tx, mut change_rx) = broadcast::channel::<()>(16);

        tokio::spawn(async move {
            if let Err(e) = watcher.watch(change_tx).await {
                error!("settings watcher error: {e}");
            }
        });

        loop {
            match change_rx.recv().await {
                Ok(()) => {
                    info!("reloading settings from {}", self.config_path.display());
                    match self.reload_config() {
                        Ok(config) => {
                            if config_tx.is_closed() {
                                info!("all settings receivers dropped, stopping reload manager");
                                break;
                            }
                            // Our own writes come back through the watcher
                            config_tx.send_if_modified(|current| {
                                if *current == config {
                                    false
                                } else {
                                    *current = config;
                                    true
                                }
                            });
                        }
                        Err(e) => {
                            warn!("settings reload failed: {e}");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("settings watcher lagged by {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("settings watcher channel closed");
                    break;
                }
            }
        }
    }

    pub(super) fn reload_config(&self) -> Result<MultipipConfig, ConfigError> {
        let config = toml_loader::load_from_path(&self.config_path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
