//! Full settings validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod overlay;
mod timing;


pub use timing::MAX_GESTURE_DELAY_MS;

use crate::schema::MultipipConfig;
use multipip_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &MultipipConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    timing::validate_timing(&mut errors, config);
    overlay::validate_overlay(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
