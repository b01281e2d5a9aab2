//! Native-or-overlay decision.
//!
//! Planning is a pure function of the page's state so the rationale can be
//! logged and tested without a host. The attempt itself lives in the
//! controller and reports a [`DetachOutcome`].

use std::fmt;

use multipip_common::DetachError;
use multipip_config::schema::OverlayConfig;

use crate::host::OverlayHandle;

/// Why the native window is not tried for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The host reports native detachment disabled document-wide.
    HostDisabled,
    /// Another video already occupies the host's single native window.
    NativeActive,
    /// Multi mode, and an earlier video in this batch already succeeded.
    BatchInProgress,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::HostDisabled => "native picture-in-picture disabled",
            Self::NativeActive => "native window already in use",
            Self::BatchInProgress => "batch already has a detached video",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPlan {
    TryNative,
    OverlayOnly(SkipReason),
}

/// Page state the plan depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanContext {
    pub native_enabled: bool,
    /// The store or the host shows a video in the native window.
    pub native_active: bool,
    pub multi_mode: bool,
    /// Successful detachments earlier in the current batch.
    pub batch_successes: usize,
}

pub fn plan_strategy(ctx: &PlanContext) -> StrategyPlan {
    if !ctx.native_enabled {
        StrategyPlan::OverlayOnly(SkipReason::HostDisabled)
    } else if ctx.native_active {
        StrategyPlan::OverlayOnly(SkipReason::NativeActive)
    } else if ctx.multi_mode && ctx.batch_successes > 0 {
        StrategyPlan::OverlayOnly(SkipReason::BatchInProgress)
    } else {
        StrategyPlan::TryNative
    }
}

/// Result of one detachment attempt.
#[derive(Debug)]
pub enum DetachOutcome {
    Native,
    Overlay(OverlayHandle),
    Failed(DetachError),
}

/// Offset from the bottom-right viewport corner for the next overlay,
/// staggered by the number of overlays already shown.
pub fn overlay_offset(config: &OverlayConfig, active_overlays: usize) -> (u32, u32) {
    let step = config.stagger.saturating_mul(active_overlays as u32);
    let offset = config.margin.saturating_add(step);
    (offset, offset)
}
