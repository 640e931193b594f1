//! Telegram delivery surface used by Haulwatch.
//!
//! Submodules provide the Bot API client wrapper, strongly typed update
//! models, the ati.su glossary client, and the notification renderer that
//! turns a parsed load posting into an HTML message.
pub mod bot;
pub mod format;
pub mod glossary;

pub use bot::BotApi;
pub use glossary::{Glossary, GlossaryClient};
