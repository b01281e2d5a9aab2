//! File watcher for live settings reload.
//!
//! Uses the `notify` crate to watch the settings file for changes,
//! with a 500ms debounce to avoid rapid reloads.

mod config_watcher;


pub use config_watcher::ConfigWatcher;
