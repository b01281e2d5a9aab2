//! Default TOML settings template with inline documentation comments.

/// Generate the default TOML settings content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# multipip settings
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[mode]
multiple_mode = false
# auto_pip = true

[timing]
# gesture_delay_ms = 100         # 0-1000, must fit the host's user-activation window
# inter_attempt_delay_ms = 500   # 0-5000, pause between detachments in a batch
# rescan_debounce_ms = 100       # 10-2000, coalesces document mutation bursts

[overlay]
# width = 320                    # 160-1280
# height = 240                   # 90-720
# margin = 20                    # distance from the viewport corner
# stagger = 30                   # offset added per already-open overlay

[logging]
# level = "INFO"                 # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
