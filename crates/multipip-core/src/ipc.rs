//! Request/response envelope between the selection panel and a page.
//!
//! Requests are JSON objects tagged by `type`:
//!
//! ```json
//! {"type":"START_PIP","videoIds":["video_1_a1b2c3d4"],"multipleMode":true}
//! ```
//!
//! Responses are untagged; their shape is fixed by the request type.

use multipip_common::{PageError, VideoId};
use serde::{Deserialize, Serialize};

use crate::controller::{BatchResult, PipStatus, StopResult};
use crate::scanner::VideoSummary;

// =============================================================================
// REQUEST ALLOWLIST
// =============================================================================

/// Request types a page accepts. Anything else is rejected and logged.
const ALLOWED_REQUEST_TYPES: &[&str] = &[
    "SCAN_VIDEOS",
    "START_PIP",
    "STOP_ALL_PIP",
    "GET_PIP_STATUS",
    "CHECK_CONTENT_SCRIPT_READY",
];

pub fn is_request_type_allowed(kind: &str) -> bool {
    ALLOWED_REQUEST_TYPES.contains(&kind)
}

// =============================================================================
// ENVELOPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    ScanVideos,
    #[serde(rename_all = "camelCase")]
    StartPip {
        video_ids: Vec<VideoId>,
        /// Falls back to the persisted setting when absent.
        #[serde(default)]
        multiple_mode: Option<bool>,
    },
    StopAllPip,
    GetPipStatus,
    CheckContentScriptReady,
}

impl Request {
    /// Parse a raw envelope, distinguishing unknown types from malformed
    /// payloads.
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| PageError::Envelope(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| PageError::Envelope("missing \"type\"".into()))?;
        if !is_request_type_allowed(kind) {
            return Err(PageError::UnknownType(kind.to_string()));
        }
        serde_json::from_value(value).map_err(|e| PageError::Envelope(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScanVideos => "SCAN_VIDEOS",
            Self::StartPip { .. } => "START_PIP",
            Self::StopAllPip => "STOP_ALL_PIP",
            Self::GetPipStatus => "GET_PIP_STATUS",
            Self::CheckContentScriptReady => "CHECK_CONTENT_SCRIPT_READY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Videos { videos: Vec<VideoSummary> },
    Batch(BatchResult),
    Stopped(StopResult),
    Status(PipStatus),
    Ready {
        #[serde(rename = "isReady")]
        is_ready: bool,
    },
    Error { success: bool, error: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            success: false,
            error: message.into(),
        }
    }
}
