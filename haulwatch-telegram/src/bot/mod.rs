//! Telegram Bot API integration surface exposed to the actor system.
//!
//! Submodules provide the HTTP client wrapper and strongly typed request and
//! response models. Only the handful of methods the watcher needs are
//! wrapped: long-polled `getUpdates`, `sendMessage`, `deleteMessage`, and
//! `setMyCommands`.
pub mod client;
pub mod types;

pub use client::BotApi;
