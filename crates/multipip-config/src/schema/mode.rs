//! Detachment mode flags shared with the selection panel and host chrome.

use serde::{Deserialize, Serialize};

/// Persisted mode flags.
///
/// Only the panel and the host-chrome toggle write these; page contexts
/// read `multiple_mode` as the batch default when a request omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Allow several videos to be detached at once. Only one of them can
    /// use the host's native window; the rest become overlays.
    pub multiple_mode: bool,
    /// Register the automatic detach-on-tab-switch script.
    pub auto_pip: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            multiple_mode: false,
            auto_pip: true,
        }
    }
}
