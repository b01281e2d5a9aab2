//! JSON-lines bridge: one page context over stdin/stdout.
//!
//! Each stdin line is a request envelope. Page requests go to the page
//! context; the host-chrome commands go to the [`Coordinator`]. Every line
//! gets exactly one response line.

use std::path::Path;
use std::sync::Arc;

use multipip_common::MultipipError;
use multipip_config::SettingsStore;
use multipip_core::{Coordinator, Host, PageHandle, Response, StaticHost};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Flip the persisted multiple-mode flag.
pub const TOGGLE_MULTIPLE_MODE: &str = "TOGGLE_MULTIPLE_MODE";
/// Detach count and badge text for the bridged page.
pub const GET_PIP_COUNT: &str = "GET_PIP_COUNT";

pub struct Bridge {
    coordinator: Coordinator,
    page: PageHandle,
}

impl Bridge {
    pub fn new(settings: SettingsStore, host: Arc<dyn Host>) -> Self {
        let mut coordinator = Coordinator::new(settings);
        let page = coordinator.open_page(host);
        Self { coordinator, page }
    }

    /// Answer one envelope.
    pub async fn dispatch(&mut self, line: &str) -> Value {
        let kind = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| v.get("type").and_then(Value::as_str).map(str::to_owned));

        match kind.as_deref() {
            Some(TOGGLE_MULTIPLE_MODE) => match self.coordinator.toggle_multiple_mode() {
                Ok(enabled) => json!({ "multipleMode": enabled }),
                Err(e) => {
                    warn!(error = %e, "multiple mode toggle failed");
                    to_value(Response::error(e.to_string()))
                }
            },
            Some(GET_PIP_COUNT) => {
                self.coordinator.drain_notices();
                let page = self.page.id();
                json!({
                    "count": self.coordinator.pip_count(page),
                    "badge": self.coordinator.badge_text(page),
                })
            }
            _ => to_value(self.page.request_json(line).await),
        }
    }

    pub async fn process_next_notice(&mut self) {
        self.coordinator.process_next_notice().await;
    }

    pub async fn shutdown(mut self) {
        self.coordinator.shutdown().await;
    }
}

fn to_value(response: Response) -> Value {
    serde_json::to_value(&response)
        .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }))
}

/// Host the snapshot at `document` and serve stdin until EOF.
pub async fn run(settings: SettingsStore, document: &Path) -> Result<(), MultipipError> {
    let raw = tokio::fs::read_to_string(document).await?;
    let host = Arc::new(StaticHost::from_json(&raw)?);
    info!(document = %document.display(), "document snapshot loaded");

    settings.watch_file();
    let mut bridge = Bridge::new(settings, host);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let response = bridge.dispatch(line).await;
                let mut out = response.to_string();
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
            () = bridge.process_next_notice() => {}
        }
    }

    debug!("stdin closed");
    bridge.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multipip_config::schema::TimingConfig;
    use multipip_config::MultipipConfig;

    const DOCUMENT: &str = r#"{
        "url": "https://videos.example.com/watch",
        "nativePolicy": "unsupported",
        "videos": [
            {
                "media": {
                    "readyState": 4, "videoWidth": 1280, "videoHeight": 720,
                    "duration": 60.0, "currentSrc": "https://cdn.example.com/a.mp4"
                },
                "layout": { "rect": { "top": 0, "left": 0, "width": 640, "height": 360 } }
            },
            {
                "media": {
                    "readyState": 4, "videoWidth": 1280, "videoHeight": 720,
                    "duration": 90.0, "currentSrc": "https://cdn.example.com/b.mp4"
                },
                "layout": { "rect": { "top": 400, "left": 0, "width": 640, "height": 360 } }
            }
        ]
    }"#;

    fn bridge() -> (Bridge, Arc<StaticHost>) {
        let settings = SettingsStore::in_memory(MultipipConfig {
            timing: TimingConfig::immediate(),
            ..Default::default()
        });
        let host = Arc::new(StaticHost::from_json(DOCUMENT).unwrap());
        (Bridge::new(settings, host.clone()), host)
    }

    #[tokio::test]
    async fn page_requests_reach_the_page() {
        let (mut bridge, _host) = bridge();
        let response = bridge.dispatch(r#"{"type":"SCAN_VIDEOS"}"#).await;
        let videos = response["videos"].as_array().unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0]["domain"], "cdn.example.com");
        assert_eq!(videos[1]["index"], 1);
    }

    #[tokio::test]
    async fn count_and_badge_follow_detachments() {
        let (mut bridge, host) = bridge();
        let response = bridge.dispatch(r#"{"type":"SCAN_VIDEOS"}"#).await;
        let ids: Vec<Value> = response["videos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].clone())
            .collect();

        let start = json!({ "type": "START_PIP", "videoIds": ids, "multipleMode": true });
        let response = bridge.dispatch(&start.to_string()).await;
        assert_eq!(response["success"], true);
        assert_eq!(response["count"], 2);
        assert_eq!(host.overlays().len(), 2);

        let count = bridge.dispatch(r#"{"type":"GET_PIP_COUNT"}"#).await;
        assert_eq!(count, json!({ "count": 2, "badge": "2" }));

        bridge.dispatch(r#"{"type":"STOP_ALL_PIP"}"#).await;
        let count = bridge.dispatch(r#"{"type":"GET_PIP_COUNT"}"#).await;
        assert_eq!(count, json!({ "count": 0, "badge": "" }));
    }

    #[tokio::test]
    async fn toggle_updates_badge() {
        let (mut bridge, _host) = bridge();
        let response = bridge.dispatch(r#"{"type":"TOGGLE_MULTIPLE_MODE"}"#).await;
        assert_eq!(response, json!({ "multipleMode": true }));

        let count = bridge.dispatch(r#"{"type":"GET_PIP_COUNT"}"#).await;
        assert_eq!(count["badge"], "M");

        let response = bridge.dispatch(r#"{"type":"TOGGLE_MULTIPLE_MODE"}"#).await;
        assert_eq!(response, json!({ "multipleMode": false }));
    }

    #[tokio::test]
    async fn malformed_lines_get_error_responses() {
        let (mut bridge, _host) = bridge();
        for line in ["not json", r#"{"type":"DELETE_EVERYTHING"}"#, r#"{"videoIds":[]}"#] {
            let response = bridge.dispatch(line).await;
            assert_eq!(response["success"], false, "line: {line}");
            assert!(response["error"].is_string());
        }
    }

    #[tokio::test]
    async fn shutdown_releases_overlays() {
        let (mut bridge, host) = bridge();
        let response = bridge.dispatch(r#"{"type":"SCAN_VIDEOS"}"#).await;
        let id = response["videos"][0]["id"].clone();
        bridge
            .dispatch(&json!({ "type": "START_PIP", "videoIds": [id] }).to_string())
            .await;
        assert_eq!(host.overlays().len(), 1);

        bridge.shutdown().await;
        assert!(host.overlays().is_empty());
    }
}
