//! In-memory host backed by a document snapshot.
//!
//! Used by the `multipip bridge` command to replay panel traffic against
//! a recorded page, and by the test suite as a scriptable host: every
//! native request, overlay insertion and exit is recorded, and the page
//! can be mutated between calls.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use multipip_common::{DetachmentId, HostError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ElementKey, EventScope, FrameAccess, Host, HostEvent, HostEventSink, Layout, MediaState,
    OverlayHandle, OverlaySpec, PresentationChange, VideoElement,
};

/// How the host answers native detachment requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativePolicy {
    #[default]
    Accept,
    /// The request is refused, e.g. no recent user activation.
    Reject,
    /// The element cannot use the native window at all.
    Unsupported,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoSnapshot {
    pub attributes: BTreeMap<String, String>,
    pub media: MediaState,
    pub layout: Layout,
    pub ancestor_title: Option<String>,
    pub article_heading: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub src: String,
    pub cross_origin: bool,
    pub videos: Vec<VideoSnapshot>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub url: String,
    #[serde(default = "default_true")]
    pub native_enabled: bool,
    #[serde(default)]
    pub native_policy: NativePolicy,
    #[serde(default)]
    pub videos: Vec<VideoSnapshot>,
    #[serde(default)]
    pub frames: Vec<FrameSnapshot>,
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self {
            url: "https://example.com/".into(),
            native_enabled: true,
            native_policy: NativePolicy::Accept,
            videos: Vec::new(),
            frames: Vec::new(),
        }
    }
}

// =============================================================================
// VIDEO ELEMENT
// =============================================================================

pub struct StaticVideo {
    key: ElementKey,
    connected: AtomicBool,
    media: Mutex<MediaState>,
    layout: Mutex<Layout>,
    attributes: Mutex<BTreeMap<String, String>>,
    ancestor_title: Option<String>,
    article_heading: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StaticVideo {
    fn from_snapshot(key: ElementKey, snapshot: VideoSnapshot) -> Self {
        Self {
            key,
            connected: AtomicBool::new(true),
            media: Mutex::new(snapshot.media),
            layout: Mutex::new(snapshot.layout),
            attributes: Mutex::new(snapshot.attributes),
            ancestor_title: snapshot.ancestor_title,
            article_heading: snapshot.article_heading,
        }
    }

    pub fn update_media(&self, f: impl FnOnce(&mut MediaState)) {
        f(&mut lock(&self.media));
    }

    pub fn update_layout(&self, f: impl FnOnce(&mut Layout)) {
        f(&mut lock(&self.layout));
    }
}

impl VideoElement for StaticVideo {
    fn key(&self) -> ElementKey {
        self.key
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn media(&self) -> MediaState {
        lock(&self.media).clone()
    }

    fn layout(&self) -> Layout {
        lock(&self.layout).clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        lock(&self.attributes).get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        lock(&self.attributes).insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        lock(&self.attributes).remove(name);
    }

    fn ancestor_title(&self) -> Option<String> {
        self.ancestor_title.clone()
    }

    fn article_heading(&self) -> Option<String> {
        self.article_heading.clone()
    }
}

// =============================================================================
// HOST
// =============================================================================

struct StaticFrame {
    src: String,
    cross_origin: bool,
    videos: Vec<Arc<StaticVideo>>,
}

struct Inner {
    url: String,
    native_enabled: bool,
    native_policy: NativePolicy,
    videos: Vec<Arc<StaticVideo>>,
    frames: Vec<StaticFrame>,
    native_element: Option<ElementKey>,
    overlays: BTreeMap<u64, OverlaySpec>,
    native_requests: Vec<ElementKey>,
    exit_requests: usize,
    observed: HashSet<ElementKey>,
    sink: Option<HostEventSink>,
}

pub struct StaticHost {
    inner: Mutex<Inner>,
    next_key: AtomicU64,
    next_overlay: AtomicU64,
}

impl StaticHost {
    pub fn new(snapshot: DocumentSnapshot) -> Self {
        let host = Self {
            inner: Mutex::new(Inner {
                url: snapshot.url,
                native_enabled: snapshot.native_enabled,
                native_policy: snapshot.native_policy,
                videos: Vec::new(),
                frames: Vec::new(),
                native_element: None,
                overlays: BTreeMap::new(),
                native_requests: Vec::new(),
                exit_requests: 0,
                observed: HashSet::new(),
                sink: None,
            }),
            next_key: AtomicU64::new(1),
            next_overlay: AtomicU64::new(1),
        };

        let videos: Vec<_> = snapshot
            .videos
            .into_iter()
            .map(|v| host.make_video(v))
            .collect();
        let frames: Vec<_> = snapshot
            .frames
            .into_iter()
            .map(|f| StaticFrame {
                src: f.src,
                cross_origin: f.cross_origin,
                videos: f.videos.into_iter().map(|v| host.make_video(v)).collect(),
            })
            .collect();
        {
            let mut inner = host.lock();
            inner.videos = videos;
            inner.frames = frames;
        }
        host
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let snapshot: DocumentSnapshot = serde_json::from_str(raw)?;
        Ok(Self::new(snapshot))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    fn make_video(&self, snapshot: VideoSnapshot) -> Arc<StaticVideo> {
        let key = ElementKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        Arc::new(StaticVideo::from_snapshot(key, snapshot))
    }

    fn emit(&self, events: Vec<HostEvent>) {
        let sink = self.lock().sink.clone();
        let Some(sink) = sink else {
            return;
        };
        for event in events {
            if sink.send(event).is_err() {
                debug!("page context gone, dropping host event");
                return;
            }
        }
    }

    fn presentation_events(
        inner: &Inner,
        element: ElementKey,
        change: PresentationChange,
    ) -> Vec<HostEvent> {
        let mut events = Vec::with_capacity(2);
        if inner.observed.contains(&element) {
            events.push(HostEvent::Presentation {
                element,
                change,
                scope: EventScope::Element,
            });
        }
        events.push(HostEvent::Presentation {
            element,
            change,
            scope: EventScope::Document,
        });
        events
    }

    // -- Scripting -----------------------------------------------------------

    /// Append a video to the top-level document.
    pub fn add_video(&self, snapshot: VideoSnapshot) -> Arc<StaticVideo> {
        let video = self.make_video(snapshot);
        self.lock().videos.push(Arc::clone(&video));
        video
    }

    /// Detach an element from the document and drop the host's reference.
    pub fn remove_video(&self, key: ElementKey) {
        let mut inner = self.lock();
        let mut removed = Vec::new();
        inner.videos.retain(|v| {
            let keep = v.key != key;
            if !keep {
                removed.push(Arc::clone(v));
            }
            keep
        });
        for frame in &mut inner.frames {
            frame.videos.retain(|v| {
                let keep = v.key != key;
                if !keep {
                    removed.push(Arc::clone(v));
                }
                keep
            });
        }
        for video in removed {
            video.connected.store(false, Ordering::Release);
        }
        if inner.native_element == Some(key) {
            inner.native_element = None;
        }
    }

    pub fn video(&self, key: ElementKey) -> Option<Arc<StaticVideo>> {
        let inner = self.lock();
        inner
            .videos
            .iter()
            .chain(inner.frames.iter().flat_map(|f| f.videos.iter()))
            .find(|v| v.key == key)
            .cloned()
    }

    /// Keys of top-level videos in document order.
    pub fn video_keys(&self) -> Vec<ElementKey> {
        self.lock().videos.iter().map(|v| v.key).collect()
    }

    pub fn set_native_policy(&self, policy: NativePolicy) {
        self.lock().native_policy = policy;
    }

    pub fn set_native_enabled(&self, enabled: bool) {
        self.lock().native_enabled = enabled;
    }

    /// Every element a native request was made for, in order.
    pub fn native_requests(&self) -> Vec<ElementKey> {
        self.lock().native_requests.clone()
    }

    pub fn exit_requests(&self) -> usize {
        self.lock().exit_requests
    }

    pub fn overlays(&self) -> Vec<OverlaySpec> {
        self.lock().overlays.values().cloned().collect()
    }

    pub fn is_observed(&self, key: ElementKey) -> bool {
        self.lock().observed.contains(&key)
    }

    /// Put `key` in the native window without going through the core,
    /// as host-native controls would.
    pub fn user_enter_native(&self, key: ElementKey) {
        let events = {
            let mut inner = self.lock();
            let mut events = Vec::new();
            if let Some(previous) = inner.native_element.replace(key) {
                events.extend(Self::presentation_events(
                    &inner,
                    previous,
                    PresentationChange::Left,
                ));
            }
            events.extend(Self::presentation_events(
                &inner,
                key,
                PresentationChange::Entered,
            ));
            events
        };
        self.emit(events);
    }

    /// Close the native window from host-native controls.
    pub fn user_exit_native(&self) {
        let events = {
            let mut inner = self.lock();
            match inner.native_element.take() {
                Some(previous) => {
                    Self::presentation_events(&inner, previous, PresentationChange::Left)
                }
                None => Vec::new(),
            }
        };
        self.emit(events);
    }

    /// Press the close affordance of an overlay.
    pub fn close_overlay(&self, detachment_id: &DetachmentId) {
        self.emit(vec![HostEvent::OverlayClosed {
            detachment_id: detachment_id.clone(),
        }]);
    }

    /// Switch the tab away from (`hidden = true`) or back to the page.
    pub fn set_hidden(&self, hidden: bool) {
        self.emit(vec![HostEvent::VisibilityChanged { hidden }]);
    }

    /// Report that nodes were added to the document.
    pub fn mutate_document(&self) {
        self.emit(vec![HostEvent::StructuralChange]);
    }
}

#[async_trait]
impl Host for StaticHost {
    fn page_url(&self) -> String {
        self.lock().url.clone()
    }

    fn videos(&self) -> Vec<Arc<dyn VideoElement>> {
        self.lock()
            .videos
            .iter()
            .map(|v| Arc::clone(v) as Arc<dyn VideoElement>)
            .collect()
    }

    fn frames(&self) -> Vec<FrameAccess> {
        self.lock()
            .frames
            .iter()
            .map(|f| {
                if f.cross_origin {
                    FrameAccess::CrossOrigin { src: f.src.clone() }
                } else {
                    FrameAccess::SameOrigin {
                        videos: f
                            .videos
                            .iter()
                            .map(|v| Arc::clone(v) as Arc<dyn VideoElement>)
                            .collect(),
                    }
                }
            })
            .collect()
    }

    fn native_enabled(&self) -> bool {
        self.lock().native_enabled
    }

    fn native_element(&self) -> Option<ElementKey> {
        self.lock().native_element
    }

    async fn request_native(&self, element: &dyn VideoElement) -> Result<(), HostError> {
        let key = element.key();
        let events = {
            let mut inner = self.lock();
            inner.native_requests.push(key);
            if !inner.native_enabled {
                return Err(HostError::Unsupported(
                    "picture-in-picture is disabled in this document".into(),
                ));
            }
            match inner.native_policy {
                NativePolicy::Accept => {}
                NativePolicy::Reject => {
                    return Err(HostError::Rejected(
                        "NotAllowedError: must be handling a user gesture".into(),
                    ));
                }
                NativePolicy::Unsupported => {
                    return Err(HostError::Unsupported(
                        "element does not support picture-in-picture".into(),
                    ));
                }
            }

            let mut events = Vec::new();
            if let Some(previous) = inner.native_element.replace(key) {
                if previous != key {
                    events.extend(Self::presentation_events(
                        &inner,
                        previous,
                        PresentationChange::Left,
                    ));
                }
            }
            events.extend(Self::presentation_events(
                &inner,
                key,
                PresentationChange::Entered,
            ));
            events
        };
        self.emit(events);
        Ok(())
    }

    async fn exit_native(&self) -> Result<(), HostError> {
        let events = {
            let mut inner = self.lock();
            inner.exit_requests += 1;
            match inner.native_element.take() {
                Some(previous) => {
                    Self::presentation_events(&inner, previous, PresentationChange::Left)
                }
                None => Vec::new(),
            }
        };
        self.emit(events);
        Ok(())
    }

    fn insert_overlay(&self, spec: &OverlaySpec) -> Result<OverlayHandle, HostError> {
        if spec.src.is_empty() {
            return Err(HostError::Rejected("overlay needs a playable source".into()));
        }
        let id = self.next_overlay.fetch_add(1, Ordering::Relaxed);
        self.lock().overlays.insert(id, spec.clone());
        Ok(OverlayHandle::new(id))
    }

    fn remove_overlay(&self, handle: OverlayHandle) {
        self.lock().overlays.remove(&handle.id());
    }

    fn observe_presentation(&self, element: &dyn VideoElement) {
        self.lock().observed.insert(element.key());
    }

    fn attach_events(&self, sink: HostEventSink) {
        self.lock().sink = Some(sink);
    }
}
