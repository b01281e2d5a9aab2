//! Geometry of the in-page overlay fallback.

use serde::{Deserialize, Serialize};

/// Overlay placement.
///
/// Overlays anchor to the bottom-right corner, `margin` pixels from the
/// viewport edges, and each additional overlay shifts up and left by
/// `stagger` pixels so none fully covers another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Width in CSS pixels (valid range: 160-1280).
    pub width: u32,
    /// Height in CSS pixels (valid range: 90-720).
    pub height: u32,
    pub margin: u32,
    pub stagger: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            margin: 20,
            stagger: 30,
        }
    }
}
