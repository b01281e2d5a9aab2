//! Write `MultipipConfig` to TOML on disk.
//!
//! Supports atomic writes (write to `.tmp`, then rename) so a crash
//! mid-write never leaves a truncated settings file behind.

use std::path::Path;

use multipip_common::ConfigError;

use crate::schema::MultipipConfig;

// =============================================================================
// PUBLIC API
// =============================================================================

/// Write settings to a specific path.
///
/// Creates parent directories if they don't exist. Uses atomic write
/// (write to `.tmp` file, then rename) to prevent partial writes.
pub fn save_config_to_path(config: &MultipipConfig, path: &Path) -> Result<(), ConfigError> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ConfigError::ParseError(format!("failed to serialize settings: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &toml_str).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write settings to {}: {e}",
            tmp_path.display()
        ))
    })?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        // Rename across some filesystems fails; fall back to a direct write.
        tracing::warn!("atomic rename failed ({}), falling back to direct write", e);
        std::fs::write(path, &toml_str).map_err(|e2| {
            ConfigError::ParseError(format!(
                "failed to write settings to {}: {e2}",
                path.display()
            ))
        })?;
    }

    tracing::debug!(path = %path.display(), "settings saved to disk");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
