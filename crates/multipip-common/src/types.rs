use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding rectangle of an element in CSS pixels, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// `true` when the rectangle covers no pixels at all.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn rounded(&self) -> RoundedRect {
        RoundedRect {
            width: self.width.round() as i64,
            height: self.height.round() as i64,
            top: self.top.round() as i64,
            left: self.left.round() as i64,
        }
    }
}

/// Integer rectangle handed to the selection panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundedRect {
    pub width: i64,
    pub height: i64,
    pub top: i64,
    pub left: i64,
}

/// One browsing tab / document instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageContextId(pub u32);

impl fmt::Display for PageContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// How a detached video is being presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// The host's own floating video window.
    Native,
    /// An in-page floating fragment owned by the controller.
    Overlay,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Overlay => f.write_str("overlay"),
        }
    }
}
