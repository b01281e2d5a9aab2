pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, DetachError, HostError, MultipipError, PageError};
pub use events::{notice_channel, Notice, NoticeSender, PageNotice};
pub use id::{DetachmentId, VideoId};
pub use types::{PageContextId, Rect, RoundedRect, Strategy};

pub type Result<T> = std::result::Result<T, MultipipError>;
