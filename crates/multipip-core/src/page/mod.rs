//! Page context: one task per page owning its controller.
//!
//! Requests from the panel or the Coordinator and signals from the host are
//! handled one at a time by a single `select!` loop, so the store is never
//! touched concurrently. Structural-change signals are coalesced: the first
//! signal of a burst schedules one rescan `rescan_debounce_ms` later and
//! the signals that follow before it fires join that rescan.

mod handle;


use std::sync::Arc;

use multipip_common::{NoticeSender, PageContextId};
use multipip_config::MultipipConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

use crate::controller::PipController;
use crate::host::{Host, HostEvent};
use crate::ipc::{Request, Response};

use handle::PageMessage;
pub use handle::PageHandle;

pub struct PageContext {
    id: PageContextId,
    controller: PipController,
    inbox: mpsc::UnboundedReceiver<PageMessage>,
    host_events: mpsc::UnboundedReceiver<HostEvent>,
    settings: watch::Receiver<MultipipConfig>,
    rescan_at: Option<Instant>,
}

impl PageContext {
    /// Attach to `host`, run an initial scan, and start the page task.
    pub fn spawn(
        host: Arc<dyn Host>,
        notices: NoticeSender,
        settings: watch::Receiver<MultipipConfig>,
    ) -> (PageHandle, JoinHandle<()>) {
        let id = notices.page();
        let (tx, inbox) = mpsc::unbounded_channel();
        let (event_tx, host_events) = mpsc::unbounded_channel();
        host.attach_events(event_tx);

        let controller = PipController::new(host, notices, &settings.borrow());
        let context = Self {
            id,
            controller,
            inbox,
            host_events,
            settings,
            rescan_at: None,
        };
        let task = tokio::spawn(context.run());
        (PageHandle::new(id, tx), task)
    }

    async fn run(mut self) {
        self.controller.scan();
        info!(page = %self.id, tracked = self.controller.store().len(), "page context started");

        loop {
            let deadline = self.rescan_at;
            let debounce = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(PageMessage::Request { request, reply }) => {
                        let response = self.handle_request(request).await;
                        if reply.send(response).is_err() {
                            debug!(page = %self.id, "requester went away before the reply");
                        }
                    }
                    Some(PageMessage::Shutdown { reply }) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        return;
                    }
                    None => {
                        self.teardown().await;
                        return;
                    }
                },
                Some(event) = self.host_events.recv() => self.handle_host_event(event).await,
                () = debounce => {
                    self.rescan_at = None;
                    self.controller.scan();
                }
            }
        }
    }

    fn settings(&self) -> MultipipConfig {
        self.settings.borrow().clone()
    }

    async fn handle_request(&mut self, request: Request) -> Response {
        let settings = self.settings();
        self.controller.apply_settings(&settings);
        debug!(page = %self.id, kind = request.kind(), "handling request");

        match request {
            Request::ScanVideos => {
                self.controller.scan();
                Response::Videos {
                    videos: self.controller.list(),
                }
            }
            Request::StartPip {
                video_ids,
                multiple_mode,
            } => {
                let multi_mode = multiple_mode.unwrap_or(settings.mode.multiple_mode);
                // Host requests must land inside the user-activation window
                // opened by the click that sent this request.
                let gesture_delay = settings.timing.gesture_delay();
                if !gesture_delay.is_zero() {
                    sleep(gesture_delay).await;
                }
                let result = self
                    .controller
                    .start_many(
                        &video_ids,
                        multi_mode,
                        settings.timing.inter_attempt_delay(),
                    )
                    .await;
                Response::Batch(result)
            }
            Request::StopAllPip => Response::Stopped(self.controller.stop_all().await),
            Request::GetPipStatus => Response::Status(self.controller.status()),
            Request::CheckContentScriptReady => Response::Ready { is_ready: true },
        }
    }

    async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::StructuralChange => {
                if self.rescan_at.is_none() {
                    let quiet = self.settings.borrow().timing.rescan_debounce();
                    self.rescan_at = Some(Instant::now() + quiet);
                }
            }
            other => {
                let settings = self.settings();
                self.controller.apply_settings(&settings);
                self.controller.handle_host_event(other).await;
            }
        }
    }

    async fn teardown(&mut self) {
        let result = self.controller.stop_all().await;
        info!(page = %self.id, stopped = result.stopped, "page context stopped");
    }
}
