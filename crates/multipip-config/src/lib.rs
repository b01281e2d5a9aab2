//! multipip settings.
//!
//! TOML-backed settings with defaults for every field, validation,
//! atomic writes and live reload. The page-facing surface is
//! [`SettingsStore`], which persists the multiple-mode flag and publishes
//! changes to every subscriber.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use multipip_config::{config_to_json, toml_loader, SettingsStore};
//!
//! let path = toml_loader::default_config_path().expect("no config directory");
//! let settings = SettingsStore::open(path).expect("failed to load settings");
//! println!("{}", config_to_json(&settings.current()));
//! ```

pub mod reload;
pub mod schema;
pub mod store;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;
pub mod watcher;

pub use reload::ReloadManager;
pub use schema::{MultipipConfig, CONFIG_SCHEMA_VERSION};
pub use store::SettingsStore;
pub use toml_writer::save_config_to_path;
pub use watcher::ConfigWatcher;

/// Serialize settings to a pretty-printed JSON string.
pub fn config_to_json(config: &MultipipConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize settings: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&MultipipConfig::default());
        assert!(json.contains("\"mode\""));
        assert!(json.contains("\"timing\""));
        assert!(json.contains("\"overlay\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("\"multiple_mode\": false"));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }
}
