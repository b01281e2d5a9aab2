//! PiP Lifecycle Controller.
//!
//! `PipController` is the only component that touches live video elements.
//! It owns the page's [`VideoStore`], drives every Attached/Detached
//! transition, and reports each one to the Coordinator as a [`Notice`].

use std::sync::Arc;

use multipip_common::{DetachmentId, Notice, NoticeSender, VideoId};
use multipip_config::schema::OverlayConfig;
use multipip_config::MultipipConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{Host, VideoElement};
use crate::scanner::{self, VideoSummary};
use crate::store::{PresentationSession, VideoStore, DETACHED_ATTR, DETACHMENT_ATTR};

mod auto;
mod batch;
mod events;
mod lifecycle;


pub use batch::BatchResult;

/// Response to `STOP_ALL_PIP`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResult {
    pub success: bool,
    pub stopped: usize,
}

/// Response to `GET_PIP_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipStatus {
    pub pip_count: usize,
    pub pip_videos: Vec<VideoId>,
}

pub struct PipController {
    host: Arc<dyn Host>,
    store: VideoStore,
    notices: NoticeSender,
    overlay: OverlayConfig,
    auto_pip: bool,
    /// Native session opened because the page was hidden.
    auto_detachment: Option<DetachmentId>,
}

impl PipController {
    pub fn new(host: Arc<dyn Host>, notices: NoticeSender, config: &MultipipConfig) -> Self {
        Self {
            host,
            store: VideoStore::new(),
            notices,
            overlay: config.overlay.clone(),
            auto_pip: config.mode.auto_pip,
            auto_detachment: None,
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn store(&self) -> &VideoStore {
        &self.store
    }

    /// Pick up the settings that affect detachment placement and
    /// automatic detachment.
    pub fn apply_settings(&mut self, config: &MultipipConfig) {
        self.overlay = config.overlay.clone();
        self.auto_pip = config.mode.auto_pip;
    }

    /// Bring the store in line with the document. Sessions of removed
    /// elements are torn down and reported as ended.
    pub fn scan(&mut self) {
        let report = scanner::scan(self.host.as_ref(), &mut self.store);
        let orphaned = report.orphans.len();
        for session in report.orphans {
            self.finish_session(session, None);
        }
        debug!(
            page = %self.notices.page(),
            tracked = self.store.len(),
            discovered = report.discovered.len(),
            removed = report.removed.len(),
            orphaned,
            "scan complete"
        );
    }

    pub fn list(&self) -> Vec<VideoSummary> {
        scanner::list(self.host.as_ref(), &self.store)
    }

    pub fn status(&self) -> PipStatus {
        PipStatus {
            pip_count: self.store.session_count(),
            pip_videos: self.store.detached_ids(),
        }
    }

    /// Release a session already removed from the store: clear the
    /// element's markers, drop its overlay, and announce the end.
    fn finish_session(
        &mut self,
        session: PresentationSession,
        element: Option<Arc<dyn VideoElement>>,
    ) {
        if let Some(element) = element {
            clear_markers(element.as_ref());
        }
        if let Some(handle) = session.overlay {
            self.host.remove_overlay(handle);
        }
        if self.auto_detachment.as_ref() == Some(&session.detachment_id) {
            self.auto_detachment = None;
        }
        tracing::info!(
            page = %self.notices.page(),
            video_id = %session.video_id,
            detachment_id = %session.detachment_id,
            strategy = %session.strategy,
            "detachment ended"
        );
        self.notices.send(Notice::DetachEnded {
            video_id: session.video_id,
            detachment_id: session.detachment_id,
        });
    }
}

fn clear_markers(element: &dyn VideoElement) {
    element.remove_attribute(DETACHED_ATTR);
    element.remove_attribute(DETACHMENT_ATTR);
}
