use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::id::{DetachmentId, VideoId};
use crate::types::{PageContextId, Strategy};

/// Notification sent from a page context to the Coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    #[serde(rename_all = "camelCase")]
    DetachStarted {
        video_id: VideoId,
        detachment_id: DetachmentId,
        strategy: Strategy,
    },
    #[serde(rename_all = "camelCase")]
    DetachEnded {
        video_id: VideoId,
        detachment_id: DetachmentId,
    },
}

impl Notice {
    pub fn video_id(&self) -> &VideoId {
        match self {
            Self::DetachStarted { video_id, .. } | Self::DetachEnded { video_id, .. } => video_id,
        }
    }
}

/// A notice tagged with the page context that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNotice {
    pub page: PageContextId,
    pub notice: Notice,
}

/// Sending half handed to every page context. Fire-and-forget: a closed
/// Coordinator never blocks or fails a page operation.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    page: PageContextId,
    sender: mpsc::UnboundedSender<PageNotice>,
}

impl NoticeSender {
    pub fn new(page: PageContextId, sender: mpsc::UnboundedSender<PageNotice>) -> Self {
        Self { page, sender }
    }

    pub fn page(&self) -> PageContextId {
        self.page
    }

    /// Returns `false` when nobody is listening any more.
    pub fn send(&self, notice: Notice) -> bool {
        let delivered = self
            .sender
            .send(PageNotice {
                page: self.page,
                notice,
            })
            .is_ok();
        if !delivered {
            tracing::debug!(page = %self.page, "no coordinator listening for notices");
        }
        delivered
    }
}

/// Create a notice channel. The receiver belongs to the Coordinator.
pub fn notice_channel() -> (
    mpsc::UnboundedSender<PageNotice>,
    mpsc::UnboundedReceiver<PageNotice>,
) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_wire_format() {
        let notice = Notice::DetachStarted {
            video_id: VideoId::from("video_1_aa"),
            detachment_id: DetachmentId::from("pip_2_10"),
            strategy: Strategy::Overlay,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["type"], "DETACH_STARTED");
        assert_eq!(json["videoId"], "video_1_aa");
        assert_eq!(json["detachmentId"], "pip_2_10");
        assert_eq!(json["strategy"], "overlay");

        let ended = Notice::DetachEnded {
            video_id: VideoId::from("video_1_aa"),
            detachment_id: DetachmentId::from("pip_2_10"),
        };
        let json = serde_json::to_value(&ended).unwrap();
        assert_eq!(json["type"], "DETACH_ENDED");
    }

    #[tokio::test]
    async fn sender_tags_notices_with_page() {
        let (tx, mut rx) = notice_channel();
        let sender = NoticeSender::new(PageContextId(7), tx);
        assert!(sender.send(Notice::DetachEnded {
            video_id: VideoId::from("v"),
            detachment_id: DetachmentId::from("d"),
        }));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.page, PageContextId(7));
        assert_eq!(received.notice.video_id().as_str(), "v");
    }

    #[test]
    fn send_without_receiver_reports_false() {
        let (tx, rx) = notice_channel();
        drop(rx);
        let sender = NoticeSender::new(PageContextId(1), tx);
        assert!(!sender.send(Notice::DetachEnded {
            video_id: VideoId::from("v"),
            detachment_id: DetachmentId::from("d"),
        }));
    }
}
