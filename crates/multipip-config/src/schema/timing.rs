//! Timing contracts for detachment requests and rescans.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between receiving `START_PIP` and issuing the first host
    /// request. Must stay inside the host's user-activation window
    /// (valid range: 0-1000).
    pub gesture_delay_ms: u64,
    /// Pause after each successful attempt in a batch, for hosts that
    /// rate-limit window creation (valid range: 0-5000).
    pub inter_attempt_delay_ms: u64,
    /// Quiet period that coalesces structural-change bursts into one
    /// rescan (valid range: 10-2000).
    pub rescan_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            gesture_delay_ms: 100,
            inter_attempt_delay_ms: 500,
            rescan_debounce_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn gesture_delay(&self) -> Duration {
        Duration::from_millis(self.gesture_delay_ms)
    }

    pub fn inter_attempt_delay(&self) -> Duration {
        Duration::from_millis(self.inter_attempt_delay_ms)
    }

    pub fn rescan_debounce(&self) -> Duration {
        Duration::from_millis(self.rescan_debounce_ms)
    }

    /// All delays zeroed, for scripted hosts that need no pacing.
    pub fn immediate() -> Self {
        Self {
            gesture_delay_ms: 0,
            inter_attempt_delay_ms: 0,
            rescan_debounce_ms: 10,
        }
    }
}
