//! Host capability surface.
//!
//! The host is whatever runtime owns the live document: it enumerates
//! video elements, performs native detachment, and inserts or removes
//! overlay fragments. The core never touches a document directly; it only
//! talks to these traits.
//!
//! Events flow the other way through a [`HostEventSink`] handed to the
//! host when a page context starts.

mod static_host;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use multipip_common::{DetachmentId, HostError, Rect, VideoId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use static_host::{
    DocumentSnapshot, FrameSnapshot, NativePolicy, StaticHost, StaticVideo, VideoSnapshot,
};

/// Host-assigned identity of a live element. Stable while the element
/// exists; the host may reuse it only after the element is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey(pub u64);

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element-{}", self.0)
    }
}

/// Playback-related state of a video element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaState {
    /// 0 = nothing loaded, 1 = metadata, up to 4 = enough data.
    pub ready_state: u8,
    pub video_width: u32,
    pub video_height: u32,
    /// `None` when the duration is unknown, e.g. before metadata loads.
    pub duration: Option<f64>,
    pub current_time: f64,
    pub paused: bool,
    pub muted: bool,
    pub volume: f64,
    pub current_src: Option<String>,
    pub src: Option<String>,
    /// Page author opted this element out of detachment.
    pub disable_picture_in_picture: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            ready_state: 0,
            video_width: 0,
            video_height: 0,
            duration: None,
            current_time: 0.0,
            paused: true,
            muted: false,
            volume: 1.0,
            current_src: None,
            src: None,
            disable_picture_in_picture: false,
        }
    }
}

impl MediaState {
    /// The source the element is actually playing, falling back to the
    /// declared one.
    pub fn resolved_src(&self) -> Option<&str> {
        self.current_src
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.src.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Computed layout of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub rect: Rect,
    pub display_none: bool,
    pub visibility_hidden: bool,
}

/// A live video element owned by the host.
pub trait VideoElement: Send + Sync {
    fn key(&self) -> ElementKey;

    /// `false` once the element has been removed from its document.
    fn is_connected(&self) -> bool;

    fn media(&self) -> MediaState;

    fn layout(&self) -> Layout;

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);

    /// `title` of the nearest ancestor that has one.
    fn ancestor_title(&self) -> Option<String>;

    /// Text of the first heading inside the nearest enclosing article.
    fn article_heading(&self) -> Option<String>;
}

/// Access to a nested document.
pub enum FrameAccess {
    SameOrigin { videos: Vec<Arc<dyn VideoElement>> },
    /// Inaccessible from the page; skipped without error.
    CrossOrigin { src: String },
}

/// What the host needs to build an overlay: a container, a player bound
/// to `src`, and a close affordance that reports `detachment_id` back
/// through [`HostEvent::OverlayClosed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
    pub detachment_id: DetachmentId,
    pub video_id: VideoId,
    pub src: String,
    pub title: String,
    pub start_time: f64,
    pub muted: bool,
    pub width: u32,
    pub height: u32,
    /// Distance from the right viewport edge.
    pub right: u32,
    /// Distance from the bottom viewport edge.
    pub bottom: u32,
}

/// Owned handle to an inserted overlay subtree. Not `Clone`: exactly one
/// session owns each overlay and must hand it back to
/// [`Host::remove_overlay`].
#[derive(Debug, PartialEq, Eq)]
pub struct OverlayHandle(u64);

impl OverlayHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationChange {
    Entered,
    Left,
}

/// Where a presentation-state listener was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    Element,
    Document,
}

/// Signals pushed by the host into a page context.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Nodes were added that may contain video elements.
    StructuralChange,
    Presentation {
        element: ElementKey,
        change: PresentationChange,
        scope: EventScope,
    },
    /// The user pressed an overlay's close affordance.
    OverlayClosed { detachment_id: DetachmentId },
    /// The page was hidden (tab switched away) or shown again.
    VisibilityChanged { hidden: bool },
}

pub type HostEventSink = mpsc::UnboundedSender<HostEvent>;

#[async_trait]
pub trait Host: Send + Sync {
    /// URL of the top-level document.
    fn page_url(&self) -> String;

    /// Video elements of the top-level document, in document order.
    fn videos(&self) -> Vec<Arc<dyn VideoElement>>;

    /// Nested documents, in document order.
    fn frames(&self) -> Vec<FrameAccess>;

    /// Document-wide native detachment switch.
    fn native_enabled(&self) -> bool;

    /// Element currently shown in the host's native window, if any.
    fn native_element(&self) -> Option<ElementKey>;

    async fn request_native(&self, element: &dyn VideoElement) -> Result<(), HostError>;

    /// Leave the native window. Succeeds when nothing is shown.
    async fn exit_native(&self) -> Result<(), HostError>;

    fn insert_overlay(&self, spec: &OverlaySpec) -> Result<OverlayHandle, HostError>;

    fn remove_overlay(&self, handle: OverlayHandle);

    /// Register element-level enter/leave listeners.
    fn observe_presentation(&self, element: &dyn VideoElement);

    /// Route structural, presentation, and overlay-close events to `sink`.
    fn attach_events(&self, sink: HostEventSink);
}
