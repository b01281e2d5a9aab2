//! Shared fixtures for unit tests.

use std::sync::Arc;

use multipip_common::{notice_channel, NoticeSender, PageContextId, PageNotice, Rect};
use multipip_config::MultipipConfig;
use tokio::sync::mpsc;

use crate::controller::PipController;
use crate::host::{
    DocumentSnapshot, Host, HostEvent, Layout, MediaState, StaticHost, VideoSnapshot,
};

pub const PAGE_URL: &str = "https://video.example.com/watch?v=1";

/// A loaded, visible 1280x720 video playing `src`.
pub fn playable(src: &str) -> VideoSnapshot {
    VideoSnapshot {
        media: MediaState {
            ready_state: 4,
            video_width: 1280,
            video_height: 720,
            duration: Some(120.0),
            current_time: 3.0,
            current_src: Some(format!("https://cdn.example.com/{src}")),
            ..Default::default()
        },
        layout: Layout {
            rect: Rect::new(0.0, 0.0, 640.0, 360.0),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn static_host(videos: Vec<VideoSnapshot>) -> Arc<StaticHost> {
    Arc::new(StaticHost::new(DocumentSnapshot {
        url: PAGE_URL.into(),
        videos,
        ..Default::default()
    }))
}

pub struct Page {
    pub host: Arc<StaticHost>,
    pub controller: PipController,
    pub notices: mpsc::UnboundedReceiver<PageNotice>,
    pub host_events: mpsc::UnboundedReceiver<HostEvent>,
}

impl Page {
    /// Controller over `n` playable videos, already scanned.
    pub fn with_videos(n: usize) -> Self {
        let videos = (0..n).map(|i| playable(&format!("{i}.mp4"))).collect();
        Self::new(static_host(videos))
    }

    pub fn new(host: Arc<StaticHost>) -> Self {
        let (tx, notices) = notice_channel();
        let (event_tx, host_events) = mpsc::unbounded_channel();
        host.attach_events(event_tx);
        let shared: Arc<dyn Host> = host.clone();
        let mut controller = PipController::new(
            shared,
            NoticeSender::new(PageContextId(1), tx),
            &MultipipConfig::default(),
        );
        controller.scan();
        Self {
            host,
            controller,
            notices,
            host_events,
        }
    }

    pub fn ids(&self) -> Vec<multipip_common::VideoId> {
        self.controller
            .store()
            .records()
            .map(|r| r.id.clone())
            .collect()
    }

    /// Feed every pending host event to the controller.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.host_events.try_recv() {
            self.controller.handle_host_event(event).await;
        }
    }

    pub fn drain_notices(&mut self) -> Vec<PageNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }
}
