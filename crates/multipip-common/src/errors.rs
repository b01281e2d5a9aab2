use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config watch error: {0}")]
    WatchError(String),
}

/// Failure reported by the host at the capability boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("rejected by host: {0}")]
    Rejected(String),
}

/// Why a single video could not be detached.
///
/// `CapabilityUnsupported` never reaches a caller: it only triggers the
/// overlay fallback. `HostRejected` is surfaced once every strategy for
/// the video has failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetachError {
    #[error("Video {0} not found")]
    NotFound(String),

    #[error("Video {0} is not ready for picture-in-picture")]
    Invalid(String),

    #[error("Video {0} is already in picture-in-picture")]
    AlreadyDetached(String),

    #[error("Video {video_id}: native picture-in-picture unavailable: {reason}")]
    CapabilityUnsupported { video_id: String, reason: String },

    #[error("Video {video_id}: {reason}")]
    HostRejected { video_id: String, reason: String },
}

impl DetachError {
    pub fn host_rejected(video_id: impl Into<String>, err: HostError) -> Self {
        match err {
            HostError::Unsupported(reason) => Self::CapabilityUnsupported {
                video_id: video_id.into(),
                reason,
            },
            HostError::Rejected(reason) => Self::HostRejected {
                video_id: video_id.into(),
                reason,
            },
        }
    }
}

/// Failures talking to a page context through its handle or envelope.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page context {0} is closed")]
    Closed(String),

    #[error("malformed envelope: {0}")]
    Envelope(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MultipipError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Detach(#[from] DetachError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("timing.gesture_delay_ms".into());
        assert_eq!(
            err.to_string(),
            "config validation error: timing.gesture_delay_ms"
        );
    }

    #[test]
    fn detach_error_messages_name_the_video() {
        assert_eq!(
            DetachError::NotFound("video_9".into()).to_string(),
            "Video video_9 not found"
        );
        assert!(DetachError::Invalid("video_2".into())
            .to_string()
            .contains("video_2"));
        assert!(DetachError::AlreadyDetached("video_3".into())
            .to_string()
            .contains("already"));
    }

    #[test]
    fn host_error_maps_to_detach_kind() {
        let err = DetachError::host_rejected("v", HostError::Unsupported("disabled".into()));
        assert!(matches!(err, DetachError::CapabilityUnsupported { .. }));

        let err = DetachError::host_rejected("v", HostError::Rejected("NotAllowedError".into()));
        assert_eq!(err.to_string(), "Video v: NotAllowedError");
    }

    #[test]
    fn multipip_error_from_variants() {
        let err: MultipipError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, MultipipError::Config(_)));
        assert!(err.to_string().contains("bad toml"));

        let err: MultipipError = PageError::Closed("page-1".into()).into();
        assert_eq!(err.to_string(), "page context page-1 is closed");

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: MultipipError = io_err.into();
        assert!(matches!(err, MultipipError::Io(_)));
    }
}
