use multipip_common::{DetachmentId, Strategy};
use tracing::{debug, trace};

use crate::host::{ElementKey, EventScope, HostEvent, PresentationChange};

use super::PipController;

impl PipController {
    /// Apply one host signal to the page state.
    pub async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::StructuralChange => self.scan(),
            HostEvent::Presentation {
                element,
                change,
                scope: EventScope::Element,
            } => self.on_presentation(element, change),
            HostEvent::Presentation {
                element,
                change,
                scope: EventScope::Document,
            } => {
                debug!(page = %self.notices.page(), %element, ?change, "document presentation change");
            }
            HostEvent::OverlayClosed { detachment_id } => self.on_overlay_closed(&detachment_id).await,
            HostEvent::VisibilityChanged { hidden: true } => self.auto_detach().await,
            HostEvent::VisibilityChanged { hidden: false } => self.auto_restore().await,
        }
    }

    /// Element-level listeners are authoritative: entering the native
    /// window adopts an attached video as a native session, leaving it ends
    /// that session. Events the host state has already moved past are
    /// dropped.
    fn on_presentation(&mut self, key: ElementKey, change: PresentationChange) {
        let showing = self.host.native_element() == Some(key);
        let stale = match change {
            PresentationChange::Entered => !showing,
            PresentationChange::Left => showing,
        };
        if stale {
            trace!(element = %key, ?change, "stale presentation change");
            return;
        }

        let Some(video_id) = self.store.id_for_element(key).cloned() else {
            trace!(element = %key, "presentation change for untracked element");
            return;
        };
        let Some(record) = self.store.get(&video_id) else {
            return;
        };

        match change {
            PresentationChange::Entered => {
                if record.is_detached {
                    // Our own request, already recorded.
                    return;
                }
                let Some(element) = record.element() else {
                    return;
                };
                debug!(video_id = %video_id, "adopting native window opened by the host");
                if let Err(e) = self.open_session(
                    &video_id,
                    element,
                    DetachmentId::generate(),
                    Strategy::Native,
                    None,
                ) {
                    debug!(video_id = %video_id, error = %e, "could not adopt native window");
                }
            }
            PresentationChange::Left => {
                let native = self
                    .store
                    .session_for_video(&video_id)
                    .filter(|s| s.strategy == Strategy::Native)
                    .map(|s| s.detachment_id.clone());
                let Some(detachment_id) = native else {
                    return;
                };
                let element = record.element();
                if let Some(session) = self.store.close_session(&detachment_id) {
                    self.finish_session(session, element);
                    self.store.debug_check();
                }
            }
        }
    }

    async fn on_overlay_closed(&mut self, detachment_id: &DetachmentId) {
        let is_overlay = self
            .store
            .session(detachment_id)
            .is_some_and(|s| s.strategy == Strategy::Overlay);
        if is_overlay {
            self.end_detachment(detachment_id).await;
        } else {
            debug!(detachment_id = %detachment_id, "close for unknown overlay ignored");
        }
    }
}
