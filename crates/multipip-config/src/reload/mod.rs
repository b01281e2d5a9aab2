//! Live settings reload manager.
//!
//! Combines the file watcher with settings loading so external edits to
//! the settings file reach every page context.

mod manager;

#[cfg(test)]
mod tests;

pub use manager::ReloadManager;
