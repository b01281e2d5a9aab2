//! Page Scanner: keeps the store in step with the host's video elements
//! and renders the filtered list shown by the selection panel.

use std::sync::Arc;

use multipip_common::{DetachmentId, RoundedRect, VideoId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::host::{FrameAccess, Host, Layout, MediaState, VideoElement};
use crate::store::{PresentationSession, VideoRecord, VideoStore};
use crate::title::{resolve_domain, resolve_title, UNKNOWN_SOURCE};

/// Renderable snapshot of one tracked video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: VideoId,
    pub title: String,
    pub src: String,
    pub domain: String,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub current_time: f64,
    pub paused: bool,
    pub muted: bool,
    pub volume: f64,
    pub rect: RoundedRect,
    pub index: usize,
    pub is_detached: bool,
    pub detachment_id: Option<DetachmentId>,
}

/// What a scan changed.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Newly tracked ids, in document order.
    pub discovered: Vec<VideoId>,
    /// Records whose element left the document.
    pub removed: Vec<VideoRecord>,
    /// Sessions of removed records. Already detached from the store; the
    /// caller must release their host resources.
    pub orphans: Vec<PresentationSession>,
}

/// Every element reachable from the page: the top-level document first,
/// then each same-origin frame. Cross-origin frames are skipped.
fn enumerate(host: &dyn Host) -> Vec<Arc<dyn VideoElement>> {
    let mut elements = host.videos();
    for frame in host.frames() {
        match frame {
            FrameAccess::SameOrigin { videos } => elements.extend(videos),
            FrameAccess::CrossOrigin { src } => {
                trace!(%src, "skipping cross-origin frame");
            }
        }
    }
    elements
}

pub fn scan(host: &dyn Host, store: &mut VideoStore) -> ScanReport {
    let mut report = ScanReport::default();

    for (dom_index, element) in enumerate(host).iter().enumerate() {
        if !element.is_connected() {
            continue;
        }
        let (id, is_new) = store.track(element, dom_index);
        if is_new {
            host.observe_presentation(element.as_ref());
            debug!(video_id = %id, element = %element.key(), "tracking new video");
            report.discovered.push(id);
        }
    }

    for id in store.dead_ids() {
        let detachment_id = store.get(&id).and_then(|r| r.detachment_id.clone());
        if let Some(detachment_id) = detachment_id {
            if let Some(session) = store.close_session(&detachment_id) {
                report.orphans.push(session);
            }
        }
        if let Some(record) = store.remove(&id) {
            debug!(video_id = %id, "video left the document");
            report.removed.push(record);
        }
    }

    store.debug_check();
    report
}

/// Ready enough to know its dimensions, not opted out, nonzero size.
pub fn is_valid(media: &MediaState) -> bool {
    media.ready_state > 0
        && !media.disable_picture_in_picture
        && media.video_width > 0
        && media.video_height > 0
}

pub fn is_visible(layout: &Layout) -> bool {
    !layout.display_none && !layout.visibility_hidden && !layout.rect.is_empty()
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Summaries of valid, visible records in document order. Filtered-out
/// records stay tracked.
pub fn list(host: &dyn Host, store: &VideoStore) -> Vec<VideoSummary> {
    let page_url = host.page_url();

    store
        .records()
        .filter_map(|record| {
            let element = record.element()?;
            let media = element.media();
            let layout = element.layout();
            if !is_valid(&media) || !is_visible(&layout) {
                return None;
            }

            let src = media.resolved_src().unwrap_or(UNKNOWN_SOURCE).to_string();
            Some(VideoSummary {
                id: record.id.clone(),
                title: resolve_title(element.as_ref(), record.dom_index),
                domain: resolve_domain(&src, &page_url),
                src,
                width: media.video_width,
                height: media.video_height,
                duration: finite_or_zero(media.duration),
                current_time: finite_or_zero(Some(media.current_time)),
                paused: media.paused,
                muted: media.muted,
                volume: media.volume,
                rect: layout.rect.rounded(),
                index: record.dom_index,
                is_detached: record.is_detached,
                detachment_id: record.detachment_id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DocumentSnapshot, FrameSnapshot, StaticHost, VideoSnapshot};
    use multipip_common::Rect;

    fn playable(src: &str) -> VideoSnapshot {
        VideoSnapshot {
            media: MediaState {
                ready_state: 4,
                video_width: 1280,
                video_height: 720,
                duration: Some(90.0),
                current_src: Some(src.into()),
                ..Default::default()
            },
            layout: Layout {
                rect: Rect::new(10.4, 0.0, 640.0, 360.2),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn host(videos: Vec<VideoSnapshot>) -> StaticHost {
        StaticHost::new(DocumentSnapshot {
            url: "https://video.example.com/watch".into(),
            videos,
            ..Default::default()
        })
    }

    #[test]
    fn ids_are_stable_across_rescans() {
        let host = host(vec![playable("a.mp4"), playable("b.mp4")]);
        let mut store = VideoStore::new();

        let first = scan(&host, &mut store);
        assert_eq!(first.discovered.len(), 2);

        host.add_video(playable("c.mp4"));
        let second = scan(&host, &mut store);
        assert_eq!(second.discovered.len(), 1);

        let ids: Vec<_> = store.records().map(|r| r.id.clone()).collect();
        assert_eq!(&ids[..2], &first.discovered[..]);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn new_elements_get_presentation_listeners() {
        let host = host(vec![playable("a.mp4")]);
        let mut store = VideoStore::new();
        scan(&host, &mut store);
        assert!(host.is_observed(host.video_keys()[0]));
    }

    #[test]
    fn sweep_drops_removed_elements() {
        let host = host(vec![playable("a.mp4"), playable("b.mp4")]);
        let mut store = VideoStore::new();
        scan(&host, &mut store);

        let gone = host.video_keys()[0];
        host.remove_video(gone);
        let report = scan(&host, &mut store);

        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].key, gone);
        assert!(report.orphans.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_origin_frames_are_scanned() {
        let host = StaticHost::new(DocumentSnapshot {
            videos: vec![playable("top.mp4")],
            frames: vec![
                FrameSnapshot {
                    src: "https://ads.example.net/".into(),
                    cross_origin: true,
                    videos: vec![playable("ad.mp4")],
                },
                FrameSnapshot {
                    src: "/embed/1".into(),
                    cross_origin: false,
                    videos: vec![playable("embed.mp4")],
                },
            ],
            ..Default::default()
        });
        let mut store = VideoStore::new();
        let report = scan(&host, &mut store);
        assert_eq!(report.discovered.len(), 2);

        let srcs: Vec<_> = list(&host, &store).into_iter().map(|s| s.src).collect();
        assert_eq!(srcs, vec!["top.mp4", "embed.mp4"]);
    }

    #[test]
    fn zero_area_video_is_hidden_but_tracked() {
        let mut collapsed = playable("b.mp4");
        collapsed.layout.rect = Rect::new(0.0, 0.0, 0.0, 200.0);
        let host = host(vec![playable("a.mp4"), collapsed]);
        let mut store = VideoStore::new();
        scan(&host, &mut store);

        assert_eq!(store.len(), 2);
        assert_eq!(list(&host, &store).len(), 1);
    }

    #[test]
    fn validity_filter() {
        let mut media = playable("a.mp4").media;
        assert!(is_valid(&media));

        media.ready_state = 0;
        assert!(!is_valid(&media));
        media.ready_state = 1;
        media.disable_picture_in_picture = true;
        assert!(!is_valid(&media));
        media.disable_picture_in_picture = false;
        media.video_height = 0;
        assert!(!is_valid(&media));
    }

    #[test]
    fn visibility_filter() {
        let mut layout = playable("a.mp4").layout;
        assert!(is_visible(&layout));
        layout.visibility_hidden = true;
        assert!(!is_visible(&layout));
        layout.visibility_hidden = false;
        layout.display_none = true;
        assert!(!is_visible(&layout));
    }

    #[test]
    fn summary_fields() {
        let mut snapshot = playable("https://cdn.example.net/a.mp4");
        snapshot.media.duration = Some(f64::INFINITY);
        snapshot.media.current_time = 12.5;
        let host = host(vec![snapshot, {
            let mut no_src = playable("");
            no_src.media.current_src = None;
            no_src
        }]);
        let mut store = VideoStore::new();
        scan(&host, &mut store);

        let summaries = list(&host, &store);
        let first = &summaries[0];
        assert_eq!(first.title, "Video 1");
        assert_eq!(first.domain, "cdn.example.net");
        assert_eq!(first.duration, 0.0);
        assert_eq!(first.current_time, 12.5);
        assert_eq!(
            first.rect,
            RoundedRect {
                width: 640,
                height: 360,
                top: 10,
                left: 0
            }
        );
        assert!(!first.is_detached);

        let second = &summaries[1];
        assert_eq!(second.src, UNKNOWN_SOURCE);
        assert_eq!(second.domain, "video.example.com");
        assert_eq!(second.title, "Video 2");

        let json = serde_json::to_value(first).unwrap();
        assert_eq!(json["isDetached"], false);
        assert!(json["detachmentId"].is_null());
        assert!(json.get("currentTime").is_some());
    }
}
