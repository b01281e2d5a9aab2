//! Process-wide Coordinator.
//!
//! Mirrors which videos are detached on each page, fed only by the
//! notices pages send. The mirror is for display: it is never consulted
//! for lifecycle decisions. Also relays host-chrome commands (stop all,
//! mode toggle) to pages.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use multipip_common::{
    notice_channel, ConfigError, Notice, NoticeSender, PageContextId, PageError, PageNotice,
    VideoId,
};
use multipip_config::SettingsStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::StopResult;
use crate::host::Host;
use crate::ipc::{Request, Response};
use crate::page::{PageContext, PageHandle};

/// Badge shown when nothing is detached but multiple mode is on.
pub const MULTI_MODE_BADGE: &str = "M";

pub struct Coordinator {
    settings: SettingsStore,
    notice_tx: mpsc::UnboundedSender<PageNotice>,
    notice_rx: mpsc::UnboundedReceiver<PageNotice>,
    pages: HashMap<PageContextId, PageHandle>,
    active: HashMap<PageContextId, HashSet<VideoId>>,
    next_page: u32,
}

impl Coordinator {
    pub fn new(settings: SettingsStore) -> Self {
        let (notice_tx, notice_rx) = notice_channel();
        Self {
            settings,
            notice_tx,
            notice_rx,
            pages: HashMap::new(),
            active: HashMap::new(),
            next_page: 1,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Start a page context for `host` and register it.
    pub fn open_page(&mut self, host: Arc<dyn Host>) -> PageHandle {
        let id = PageContextId(self.next_page);
        self.next_page += 1;

        let notices = NoticeSender::new(id, self.notice_tx.clone());
        let (handle, _task) = PageContext::spawn(host, notices, self.settings.subscribe());
        self.register_page(handle.clone());
        handle
    }

    /// Track a page started elsewhere. Notices from unregistered pages are
    /// ignored.
    pub fn register_page(&mut self, handle: PageHandle) {
        let id = handle.id();
        if id.0 >= self.next_page {
            self.next_page = id.0 + 1;
        }
        self.pages.insert(id, handle);
        debug!(page = %id, "page registered");
    }

    pub fn page(&self, page: PageContextId) -> Option<&PageHandle> {
        self.pages.get(&page)
    }

    /// The page went away: forget its aggregate and stop its task.
    pub async fn page_closed(&mut self, page: PageContextId) {
        self.active.remove(&page);
        if let Some(handle) = self.pages.remove(&page) {
            if let Err(e) = handle.shutdown().await {
                debug!(page = %page, error = %e, "page already stopped");
            }
            info!(page = %page, "page closed");
        }
    }

    // -- Notices ------------------------------------------------------------

    pub fn handle_notice(&mut self, notice: PageNotice) {
        let PageNotice { page, notice } = notice;
        if !self.pages.contains_key(&page) {
            debug!(page = %page, "notice from unregistered page ignored");
            return;
        }

        match notice {
            Notice::DetachStarted { video_id, .. } => {
                self.active.entry(page).or_default().insert(video_id);
            }
            Notice::DetachEnded { video_id, .. } => {
                if let Some(videos) = self.active.get_mut(&page) {
                    videos.remove(&video_id);
                    if videos.is_empty() {
                        self.active.remove(&page);
                    }
                }
            }
        }
        debug!(page = %page, count = self.pip_count(page), "detach count updated");
    }

    /// Apply every notice already queued. Returns how many were applied.
    pub fn drain_notices(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(notice) = self.notice_rx.try_recv() {
            self.handle_notice(notice);
            applied += 1;
        }
        applied
    }

    /// Wait for the next notice and apply it.
    pub async fn process_next_notice(&mut self) {
        if let Some(notice) = self.notice_rx.recv().await {
            self.handle_notice(notice);
        }
    }

    // -- Queries ------------------------------------------------------------

    pub fn pip_count(&self, page: PageContextId) -> usize {
        self.active.get(&page).map_or(0, HashSet::len)
    }

    /// Count of detached videos, or the multiple-mode marker when there are
    /// none and the mode is on, else empty.
    pub fn badge_text(&self, page: PageContextId) -> String {
        match self.pip_count(page) {
            0 if self.settings.current().mode.multiple_mode => MULTI_MODE_BADGE.to_string(),
            0 => String::new(),
            n => n.to_string(),
        }
    }

    // -- Commands -----------------------------------------------------------

    pub async fn stop_all(&self, page: PageContextId) -> Result<StopResult, PageError> {
        let handle = self
            .pages
            .get(&page)
            .ok_or_else(|| PageError::Closed(page.to_string()))?;
        match handle.request(Request::StopAllPip).await? {
            Response::Stopped(result) => Ok(result),
            other => {
                warn!(page = %page, response = ?other, "unexpected reply to stop all");
                Err(PageError::Envelope(format!("unexpected reply: {other:?}")))
            }
        }
    }

    /// Flip and persist the multiple-mode flag. Pages see the new value on
    /// their next `START_PIP` without it.
    pub fn toggle_multiple_mode(&self) -> Result<bool, ConfigError> {
        self.settings.toggle_multiple_mode()
    }

    /// Stop every page.
    pub async fn shutdown(&mut self) {
        let pages: Vec<_> = self.pages.keys().copied().collect();
        for page in pages {
            self.page_closed(page).await;
        }
    }
}
