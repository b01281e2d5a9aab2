use std::time::Duration;

use multipip_common::VideoId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::PipController;

/// Response to `START_PIP`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success: bool,
    pub count: usize,
    /// Per-id failures joined with `"; "`. Empty when every id succeeded.
    pub error: String,
}

impl PipController {
    /// Detach `ids` one after another.
    ///
    /// Each attempt completes before the next starts. After a success the
    /// batch pauses for `pause` unless it was the last id. A failing id is
    /// recorded and the batch moves on.
    pub async fn start_many(
        &mut self,
        ids: &[VideoId],
        multi_mode: bool,
        pause: Duration,
    ) -> BatchResult {
        let mut count = 0;
        let mut errors = Vec::new();

        for (i, id) in ids.iter().enumerate() {
            match self.start_detachment(id, multi_mode, count).await {
                Ok(_) => {
                    count += 1;
                    if !pause.is_zero() && i + 1 < ids.len() {
                        tokio::time::sleep(pause).await;
                    }
                }
                Err(e) => {
                    warn!(page = %self.notices.page(), video_id = %id, error = %e, "detachment failed");
                    errors.push(e.to_string());
                }
            }
        }

        info!(
            page = %self.notices.page(),
            requested = ids.len(),
            count,
            multi_mode,
            "batch finished"
        );
        BatchResult {
            success: count > 0,
            count,
            error: errors.join("; "),
        }
    }
}
