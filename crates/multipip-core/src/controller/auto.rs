use multipip_common::{DetachmentId, Strategy, VideoId};
use tracing::debug;

use crate::scanner::{is_valid, is_visible};

use super::PipController;

impl PipController {
    /// Page hidden: move the largest playing video into the native
    /// window, if auto mode is on and the window is free.
    pub(super) async fn auto_detach(&mut self) {
        if !self.auto_pip
            || self.auto_detachment.is_some()
            || self.store.native_session().is_some()
            || self.host.native_element().is_some()
            || !self.host.native_enabled()
        {
            return;
        }

        let Some(video_id) = self.auto_candidate() else {
            return;
        };
        let Some(element) = self.store.get(&video_id).and_then(|r| r.element()) else {
            return;
        };

        if let Err(e) = self.host.request_native(element.as_ref()).await {
            debug!(video_id = %video_id, error = %e, "automatic detachment refused");
            return;
        }

        let detachment_id = DetachmentId::generate();
        if self
            .open_session(&video_id, element, detachment_id.clone(), Strategy::Native, None)
            .is_ok()
        {
            self.auto_detachment = Some(detachment_id);
        }
    }

    /// Page shown again: undo the automatic detachment if it is still
    /// active.
    pub(super) async fn auto_restore(&mut self) {
        if let Some(detachment_id) = self.auto_detachment.take() {
            self.end_detachment(&detachment_id).await;
        }
    }

    fn auto_candidate(&self) -> Option<VideoId> {
        self.store
            .records()
            .filter(|r| !r.is_detached)
            .filter_map(|r| {
                let element = r.element()?;
                let media = element.media();
                let layout = element.layout();
                let eligible = is_valid(&media) && !media.paused && is_visible(&layout);
                eligible.then(|| (r.id.clone(), layout.rect.width * layout.rect.height))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}
