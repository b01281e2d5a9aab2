use std::sync::Arc;

use multipip_common::{DetachError, DetachmentId, HostError, Notice, Strategy, VideoId};
use tracing::{debug, info, warn};

use crate::host::{OverlayHandle, OverlaySpec, VideoElement};
use crate::scanner::is_valid;
use crate::store::{PresentationSession, DETACHED_ATTR, DETACHMENT_ATTR};
use crate::strategy::{overlay_offset, plan_strategy, DetachOutcome, PlanContext, StrategyPlan};
use crate::title::resolve_title;

use super::{clear_markers, PipController, StopResult};

impl PipController {
    /// Attached -> Detached for one video.
    ///
    /// Checks run in order: the id must be tracked with a live element,
    /// the element must be valid, and it must not already be detached
    /// (by record or by marker attribute). The native window is tried
    /// when [`plan_strategy`] allows it; any native failure falls through
    /// to an overlay and is not reported.
    ///
    /// `batch_successes` is the number of videos already detached by the
    /// calling batch.
    pub async fn start_detachment(
        &mut self,
        video_id: &VideoId,
        multi_mode: bool,
        batch_successes: usize,
    ) -> Result<DetachmentId, DetachError> {
        let (element, dom_index, already_detached) = {
            let record = self
                .store
                .get(video_id)
                .ok_or_else(|| DetachError::NotFound(video_id.to_string()))?;
            let element = record
                .element()
                .ok_or_else(|| DetachError::NotFound(video_id.to_string()))?;
            (element, record.dom_index, record.is_detached)
        };

        if !is_valid(&element.media()) {
            return Err(DetachError::Invalid(video_id.to_string()));
        }
        if already_detached || element.attribute(DETACHED_ATTR).is_some() {
            return Err(DetachError::AlreadyDetached(video_id.to_string()));
        }

        let detachment_id = DetachmentId::generate();
        let plan = plan_strategy(&PlanContext {
            native_enabled: self.host.native_enabled(),
            native_active: self.store.native_session().is_some()
                || self.host.native_element().is_some(),
            multi_mode,
            batch_successes,
        });

        let outcome = match plan {
            StrategyPlan::TryNative => match self.host.request_native(element.as_ref()).await {
                Ok(()) => DetachOutcome::Native,
                Err(e) => {
                    let err = DetachError::host_rejected(video_id.as_str(), e);
                    debug!(video_id = %video_id, error = %err, "native attempt failed, using overlay");
                    self.attempt_overlay(video_id, element.as_ref(), dom_index, &detachment_id)
                }
            },
            StrategyPlan::OverlayOnly(reason) => {
                debug!(video_id = %video_id, %reason, "skipping native attempt");
                self.attempt_overlay(video_id, element.as_ref(), dom_index, &detachment_id)
            }
        };

        let (strategy, overlay) = match outcome {
            DetachOutcome::Native => (Strategy::Native, None),
            DetachOutcome::Overlay(handle) => (Strategy::Overlay, Some(handle)),
            DetachOutcome::Failed(err) => return Err(err),
        };

        self.open_session(video_id, element, detachment_id.clone(), strategy, overlay)?;
        Ok(detachment_id)
    }

    fn attempt_overlay(
        &self,
        video_id: &VideoId,
        element: &dyn VideoElement,
        dom_index: usize,
        detachment_id: &DetachmentId,
    ) -> DetachOutcome {
        let media = element.media();
        let Some(src) = media.resolved_src() else {
            return DetachOutcome::Failed(DetachError::HostRejected {
                video_id: video_id.to_string(),
                reason: "no playable source for overlay".into(),
            });
        };

        let (right, bottom) = overlay_offset(&self.overlay, self.store.overlay_count());
        let spec = OverlaySpec {
            detachment_id: detachment_id.clone(),
            video_id: video_id.clone(),
            src: src.to_string(),
            title: resolve_title(element, dom_index),
            start_time: media.current_time,
            muted: media.muted,
            width: self.overlay.width,
            height: self.overlay.height,
            right,
            bottom,
        };

        match self.host.insert_overlay(&spec) {
            Ok(handle) => DetachOutcome::Overlay(handle),
            Err(HostError::Unsupported(reason) | HostError::Rejected(reason)) => {
                DetachOutcome::Failed(DetachError::HostRejected {
                    video_id: video_id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Record a successful detachment and announce it.
    pub(super) fn open_session(
        &mut self,
        video_id: &VideoId,
        element: Arc<dyn VideoElement>,
        detachment_id: DetachmentId,
        strategy: Strategy,
        overlay: Option<OverlayHandle>,
    ) -> Result<(), DetachError> {
        let session = PresentationSession {
            detachment_id: detachment_id.clone(),
            video_id: video_id.clone(),
            strategy,
            overlay,
        };
        if let Err(rejected) = self.store.open_session(session) {
            if let Some(handle) = rejected.overlay {
                self.host.remove_overlay(handle);
            }
            return Err(DetachError::AlreadyDetached(video_id.to_string()));
        }

        element.set_attribute(DETACHED_ATTR, "true");
        element.set_attribute(DETACHMENT_ATTR, detachment_id.as_str());
        self.store.debug_check();

        info!(
            page = %self.notices.page(),
            video_id = %video_id,
            detachment_id = %detachment_id,
            %strategy,
            "detachment started"
        );
        self.notices.send(Notice::DetachStarted {
            video_id: video_id.clone(),
            detachment_id,
            strategy,
        });
        Ok(())
    }

    /// Detached -> Attached for one session. Unknown ids are ignored.
    /// Returns whether a session was ended.
    pub async fn end_detachment(&mut self, detachment_id: &DetachmentId) -> bool {
        let Some(session) = self.store.close_session(detachment_id) else {
            debug!(detachment_id = %detachment_id, "end for unknown detachment ignored");
            return false;
        };

        let record = self.store.get(&session.video_id);
        let element = record.and_then(|r| r.element());
        let key = record.map(|r| r.key);

        if session.strategy == Strategy::Native && key.is_some() && self.host.native_element() == key
        {
            if let Err(e) = self.host.exit_native().await {
                warn!(detachment_id = %detachment_id, error = %e, "failed to exit native window");
            }
        }

        self.finish_session(session, element);
        self.store.debug_check();
        true
    }

    /// End every detachment on the page.
    ///
    /// The host is asked to leave its native window whenever it reports
    /// one, even if no session tracks it. Marker attributes left on
    /// tracked elements without a session are cleared too. Each ended
    /// session, untracked native exit and stray marker counts as stopped.
    pub async fn stop_all(&mut self) -> StopResult {
        let mut stopped = 0;
        let mut success = true;

        if let Some(native) = self.host.native_element() {
            let tracked = self
                .store
                .native_session()
                .and_then(|s| self.store.get(&s.video_id))
                .is_some_and(|r| r.key == native);
            match self.host.exit_native().await {
                Ok(()) if !tracked => stopped += 1,
                Ok(()) => {}
                Err(e) => {
                    warn!(element = %native, error = %e, "failed to exit native window");
                    success = false;
                }
            }
        }

        for detachment_id in self.store.detachment_ids() {
            if let Some(session) = self.store.close_session(&detachment_id) {
                let element = self.store.get(&session.video_id).and_then(|r| r.element());
                self.finish_session(session, element);
                stopped += 1;
            }
        }

        for record in self.store.records() {
            if let Some(element) = record.element() {
                if element.attribute(DETACHED_ATTR).is_some() {
                    clear_markers(element.as_ref());
                    stopped += 1;
                }
            }
        }

        self.store.debug_check();
        info!(page = %self.notices.page(), stopped, "stopped all detachments");
        StopResult { success, stopped }
    }
}
