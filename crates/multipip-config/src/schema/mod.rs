//! Settings schema types for multipip.
//!
//! All structs use `serde(default)` so partial settings files work.

mod mode;
mod overlay;
mod system;
mod timing;

pub use mode::*;
pub use overlay::*;
pub use system::*;
pub use timing::*;

use serde::{Deserialize, Serialize};

/// Current settings schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MultipipConfig {
    pub mode: ModeConfig,
    pub timing: TimingConfig,
    pub overlay: OverlayConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stored_defaults() {
        let config = MultipipConfig::default();
        assert!(!config.mode.multiple_mode);
        assert!(config.mode.auto_pip);
        assert_eq!(config.timing.gesture_delay_ms, 100);
        assert_eq!(config.timing.inter_attempt_delay_ms, 500);
        assert_eq!(config.timing.rescan_debounce_ms, 100);
        assert_eq!(config.overlay.width, 320);
        assert_eq!(config.overlay.height, 240);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: MultipipConfig = toml::from_str(
            r#"
[mode]
multiple_mode = true
"#,
        )
        .unwrap();
        assert!(config.mode.multiple_mode);
        assert!(config.mode.auto_pip);
        assert_eq!(config.overlay.stagger, 30);
    }

    #[test]
    fn log_level_parses_uppercase() {
        let config: MultipipConfig = toml::from_str(
            r#"
[logging]
level = "WARNING"
"#,
        )
        .unwrap();
        assert_eq!(config.logging.level, LogLevel::Warning);
        assert_eq!(config.logging.level.as_directive(), "warn");
    }

    #[test]
    fn timing_durations() {
        let timing = TimingConfig::default();
        assert_eq!(timing.gesture_delay().as_millis(), 100);
        assert_eq!(timing.inter_attempt_delay().as_millis(), 500);
        assert_eq!(TimingConfig::immediate().inter_attempt_delay_ms, 0);
    }
}
