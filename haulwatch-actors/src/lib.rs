//! Actor runtime and the domain actors composing the watch pipeline.
//!
//! The runtime half (mailboxes, registry, builder, shutdown, supervision,
//! rate limiting) is generic; the domain half wires the browsing session,
//! the interceptor with its dedup cell, the delivery sink, and the Telegram
//! command surface into one watch loop.

pub mod actor;
pub mod bot;
pub mod builder;
pub mod deliver;
pub mod intercept;
pub mod rate;
pub mod registry;
pub mod supervise;
pub mod system;
pub mod watch;

use tokio::sync::oneshot;

/// Watch loop lifecycle, exposed for status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Idle,
    SettingUp,
    Running,
    Stopping,
}

#[derive(Debug)]
pub struct WatchStatus {
    pub enabled: bool,
    pub phase: WatchPhase,
    pub url: Option<String>,
}

/// Commands understood by [`watch::WatchActor`].
pub enum WatchMsg {
    /// Start watching `url`, delivering notifications to `chat_id`. Ignored
    /// while a watch is already active.
    Begin { chat_id: i64, url: String },
    /// Stop the active watch, if any. Always safe.
    End,
    Status {
        reply: oneshot::Sender<WatchStatus>,
    },
    /// Internal: the watch task finished and the actor is idle again.
    Ended,
}
