//! Per-page record and session tables.
//!
//! `VideoStore` is owned by a page's [`PipController`](crate::PipController)
//! and lent to the scanner. Records are keyed by [`VideoId`]; the live
//! element is reachable only through a `Weak` back-pointer so a record never
//! keeps a removed element alive.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use multipip_common::{DetachmentId, Strategy, VideoId};

use crate::host::{ElementKey, OverlayHandle, VideoElement};

/// Marker attribute set on an element while it is detached.
pub const DETACHED_ATTR: &str = "data-multipip-detached";
/// Carries the detachment id of the session presenting the element.
pub const DETACHMENT_ATTR: &str = "data-multipip-detachment";

pub struct VideoRecord {
    pub id: VideoId,
    /// Position at assignment time. Informational only.
    pub dom_index: usize,
    pub is_detached: bool,
    pub detachment_id: Option<DetachmentId>,
    pub key: ElementKey,
    element: Weak<dyn VideoElement>,
}

impl VideoRecord {
    /// The element, if it is still alive and attached to its document.
    pub fn element(&self) -> Option<Arc<dyn VideoElement>> {
        self.element.upgrade().filter(|e| e.is_connected())
    }

    pub fn is_live(&self) -> bool {
        self.element().is_some()
    }

    fn refers_to(&self, element: &Arc<dyn VideoElement>) -> bool {
        self.element
            .upgrade()
            .is_some_and(|existing| Arc::ptr_eq(&existing, element))
    }
}

impl std::fmt::Debug for VideoRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRecord")
            .field("id", &self.id)
            .field("dom_index", &self.dom_index)
            .field("is_detached", &self.is_detached)
            .field("detachment_id", &self.detachment_id)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Debug)]
pub struct PresentationSession {
    pub detachment_id: DetachmentId,
    pub video_id: VideoId,
    pub strategy: Strategy,
    /// Present iff `strategy` is `Overlay`.
    pub overlay: Option<OverlayHandle>,
}

#[derive(Default)]
pub struct VideoStore {
    records: HashMap<VideoId, VideoRecord>,
    order: Vec<VideoId>,
    by_element: HashMap<ElementKey, VideoId>,
    sessions: HashMap<DetachmentId, PresentationSession>,
}

impl VideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for `element`, creating one if the element has
    /// not been seen before. Returns the id and whether it is new.
    pub fn track(&mut self, element: &Arc<dyn VideoElement>, dom_index: usize) -> (VideoId, bool) {
        let key = element.key();
        if let Some(id) = self.by_element.get(&key) {
            if self.records.get(id).is_some_and(|r| r.refers_to(element)) {
                return (id.clone(), false);
            }
        }

        let id = VideoId::generate();
        self.records.insert(
            id.clone(),
            VideoRecord {
                id: id.clone(),
                dom_index,
                is_detached: false,
                detachment_id: None,
                key,
                element: Arc::downgrade(element),
            },
        );
        self.order.push(id.clone());
        self.by_element.insert(key, id.clone());
        (id, true)
    }

    pub fn get(&self, id: &VideoId) -> Option<&VideoRecord> {
        self.records.get(id)
    }

    pub fn id_for_element(&self, key: ElementKey) -> Option<&VideoId> {
        self.by_element.get(&key)
    }

    /// Records in the order they were first observed.
    pub fn records(&self) -> impl Iterator<Item = &VideoRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of records whose element is gone.
    pub fn dead_ids(&self) -> Vec<VideoId> {
        self.records()
            .filter(|r| !r.is_live())
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn remove(&mut self, id: &VideoId) -> Option<VideoRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|o| o != id);
        if self.by_element.get(&record.key) == Some(id) {
            self.by_element.remove(&record.key);
        }
        Some(record)
    }

    // -- Sessions -----------------------------------------------------------

    /// Mark the record detached and take ownership of its session.
    /// Hands the session back if the record is missing or already detached.
    pub fn open_session(&mut self, session: PresentationSession) -> Result<(), PresentationSession> {
        let Some(record) = self.records.get_mut(&session.video_id) else {
            return Err(session);
        };
        if record.is_detached {
            return Err(session);
        }
        record.is_detached = true;
        record.detachment_id = Some(session.detachment_id.clone());
        self.sessions
            .insert(session.detachment_id.clone(), session);
        Ok(())
    }

    /// Drop a session and return its record to the attached state.
    pub fn close_session(&mut self, detachment_id: &DetachmentId) -> Option<PresentationSession> {
        let session = self.sessions.remove(detachment_id)?;
        if let Some(record) = self.records.get_mut(&session.video_id) {
            if record.detachment_id.as_ref() == Some(detachment_id) {
                record.is_detached = false;
                record.detachment_id = None;
            }
        }
        Some(session)
    }

    pub fn session(&self, detachment_id: &DetachmentId) -> Option<&PresentationSession> {
        self.sessions.get(detachment_id)
    }

    pub fn session_for_video(&self, video_id: &VideoId) -> Option<&PresentationSession> {
        let detachment_id = self.records.get(video_id)?.detachment_id.as_ref()?;
        self.sessions.get(detachment_id)
    }

    /// The session presented through the host's native window, if any.
    pub fn native_session(&self) -> Option<&PresentationSession> {
        self.sessions
            .values()
            .find(|s| s.strategy == Strategy::Native)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn overlay_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.strategy == Strategy::Overlay)
            .count()
    }

    /// Detachment ids of all sessions, ordered by their record's position.
    pub fn detachment_ids(&self) -> Vec<DetachmentId> {
        self.records()
            .filter_map(|r| r.detachment_id.clone())
            .collect()
    }

    /// Ids of detached records in record order.
    pub fn detached_ids(&self) -> Vec<VideoId> {
        self.records()
            .filter(|r| r.is_detached)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Verify record/session consistency: a record is detached iff it
    /// carries a detachment id, and detached records and sessions pair up
    /// one to one.
    pub fn check_invariants(&self) -> Result<(), String> {
        for record in self.records.values() {
            match (record.is_detached, &record.detachment_id) {
                (true, Some(did)) => match self.sessions.get(did) {
                    Some(session) if session.video_id == record.id => {}
                    Some(session) => {
                        return Err(format!(
                            "session {did} belongs to {} not {}",
                            session.video_id, record.id
                        ))
                    }
                    None => return Err(format!("record {} has no session {did}", record.id)),
                },
                (false, None) => {}
                (detached, did) => {
                    return Err(format!(
                        "record {} is_detached={detached} detachment_id={did:?}",
                        record.id
                    ))
                }
            }
        }

        for (did, session) in &self.sessions {
            let paired = self
                .records
                .get(&session.video_id)
                .is_some_and(|r| r.detachment_id.as_ref() == Some(did));
            if !paired {
                return Err(format!("orphaned session {did} for {}", session.video_id));
            }
            if (session.strategy == Strategy::Overlay) != session.overlay.is_some() {
                return Err(format!("session {did} overlay handle mismatch"));
            }
        }
        Ok(())
    }

    pub(crate) fn debug_check(&self) {
        if cfg!(debug_assertions) {
            if let Err(violation) = self.check_invariants() {
                tracing::error!(%violation, "video store invariant violated");
                debug_assert!(false, "video store invariant violated: {violation}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DocumentSnapshot, Host, StaticHost, VideoSnapshot};

    fn host_with(n: usize) -> StaticHost {
        StaticHost::new(DocumentSnapshot {
            videos: vec![VideoSnapshot::default(); n],
            ..Default::default()
        })
    }

    fn session(video_id: &VideoId, strategy: Strategy) -> PresentationSession {
        PresentationSession {
            detachment_id: DetachmentId::generate(),
            video_id: video_id.clone(),
            strategy,
            overlay: (strategy == Strategy::Overlay).then(|| OverlayHandle::new(1)),
        }
    }

    #[test]
    fn tracking_same_element_twice_keeps_id() {
        let host = host_with(2);
        let mut store = VideoStore::new();
        let videos = host.videos();

        let (a, new_a) = store.track(&videos[0], 0);
        let (b, _) = store.track(&videos[1], 1);
        let (again, new_again) = store.track(&videos[0], 0);

        assert!(new_a);
        assert!(!new_again);
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn removed_element_shows_up_as_dead() {
        let host = host_with(2);
        let mut store = VideoStore::new();
        let videos = host.videos();
        let (a, _) = store.track(&videos[0], 0);
        store.track(&videos[1], 1);

        host.remove_video(videos[0].key());
        assert_eq!(store.dead_ids(), vec![a.clone()]);

        store.remove(&a);
        assert!(store.id_for_element(videos[0].key()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sessions_pair_with_records() {
        let host = host_with(1);
        let mut store = VideoStore::new();
        let (id, _) = store.track(&host.videos()[0], 0);

        let s = session(&id, Strategy::Overlay);
        let did = s.detachment_id.clone();
        store.open_session(s).unwrap();

        let record = store.get(&id).unwrap();
        assert!(record.is_detached);
        assert_eq!(record.detachment_id.as_ref(), Some(&did));
        assert_eq!(store.overlay_count(), 1);
        assert!(store.check_invariants().is_ok());

        // A second session for the same record is refused.
        assert!(store.open_session(session(&id, Strategy::Native)).is_err());

        let closed = store.close_session(&did).unwrap();
        assert_eq!(closed.video_id, id);
        assert!(!store.get(&id).unwrap().is_detached);
        assert_eq!(store.session_count(), 0);
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn session_for_unknown_record_is_refused() {
        let mut store = VideoStore::new();
        let ghost = VideoId::from("video_0_dead");
        assert!(store.open_session(session(&ghost, Strategy::Native)).is_err());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn native_session_lookup() {
        let host = host_with(2);
        let mut store = VideoStore::new();
        let videos = host.videos();
        let (a, _) = store.track(&videos[0], 0);
        let (b, _) = store.track(&videos[1], 1);

        store.open_session(session(&a, Strategy::Overlay)).unwrap();
        assert!(store.native_session().is_none());
        store.open_session(session(&b, Strategy::Native)).unwrap();
        assert_eq!(store.native_session().unwrap().video_id, b);
        assert_eq!(store.detached_ids(), vec![a, b]);
    }
}
