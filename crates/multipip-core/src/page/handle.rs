use multipip_common::{PageContextId, PageError};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::ipc::{Request, Response};

pub(super) enum PageMessage {
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable address of a running page context.
#[derive(Clone)]
pub struct PageHandle {
    id: PageContextId,
    tx: mpsc::UnboundedSender<PageMessage>,
}

impl PageHandle {
    pub(super) fn new(id: PageContextId, tx: mpsc::UnboundedSender<PageMessage>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> PageContextId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn closed(&self) -> PageError {
        PageError::Closed(self.id.to_string())
    }

    /// Queue a request and wait for the page to answer it.
    pub async fn request(&self, request: Request) -> Result<Response, PageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PageMessage::Request { request, reply })
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    /// Parse a raw envelope and dispatch it. Rejected envelopes and closed
    /// pages become error responses.
    pub async fn request_json(&self, raw: &str) -> Response {
        let request = match Request::from_json(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(page = %self.id, body_len = raw.len(), error = %e, "request rejected");
                return Response::error(e.to_string());
            }
        };
        match self.request(request).await {
            Ok(response) => response,
            Err(e) => Response::error(e.to_string()),
        }
    }

    /// End every detachment, then stop the page task.
    pub async fn shutdown(&self) -> Result<(), PageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PageMessage::Shutdown { reply })
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }
}
