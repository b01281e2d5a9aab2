//! Validation for the timing section.

use crate::schema::MultipipConfig;

use super::helpers::validate_range;

/// Longest gesture delay that still lands inside the host's transient
/// user-activation window.
pub const MAX_GESTURE_DELAY_MS: u64 = 1000;

pub(crate) fn validate_timing(errors: &mut Vec<String>, config: &MultipipConfig) {
    validate_range(
        errors,
        "timing.gesture_delay_ms",
        config.timing.gesture_delay_ms,
        0,
        MAX_GESTURE_DELAY_MS,
    );
    validate_range(
        errors,
        "timing.inter_attempt_delay_ms",
        config.timing.inter_attempt_delay_ms,
        0,
        5000,
    );
    validate_range(
        errors,
        "timing.rescan_debounce_ms",
        config.timing.rescan_debounce_ms,
        10,
        2000,
    );
}
