//! Multi-video picture-in-picture core.
//!
//! - Page Scanner: tracks video elements and lists the detachable ones
//! - Lifecycle Controller: native-then-overlay detachment and teardown
//! - Page context: one task per page behind a typed request envelope
//! - Coordinator: per-page detach counts and host-chrome commands
//!
//! The core reaches the document only through the [`Host`] trait.

pub mod controller;
pub mod coordinator;
pub mod host;
pub mod ipc;
pub mod page;
pub mod scanner;
pub mod store;
pub mod strategy;
pub mod title;

#[cfg(test)]
mod testing;

pub use controller::{BatchResult, PipController, PipStatus, StopResult};
pub use coordinator::Coordinator;
pub use host::{DocumentSnapshot, Host, HostEvent, StaticHost, VideoElement};
pub use ipc::{Request, Response};
pub use page::{PageContext, PageHandle};
pub use scanner::VideoSummary;
pub use store::VideoStore;
pub use strategy::{plan_strategy, DetachOutcome, StrategyPlan};
