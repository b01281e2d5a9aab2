//! Core TOML settings loading.

use crate::schema::MultipipConfig;
use multipip_common::ConfigError;
use std::path::Path;
use tracing::info;

/// Load settings from a specific TOML file path.
///
/// Missing fields take serde defaults. Range checks are left to the
/// caller, see [`validate`](crate::validation::validate).
pub fn load_from_path(path: &Path) -> Result<MultipipConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: MultipipConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded settings from {}", path.display());
    Ok(config)
}
