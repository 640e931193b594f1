//! Driver layer for browser automation and traffic interception.
//!
//! This crate exposes the browser session used by the watch loop to keep a
//! logged-in loads listing open, and the tap that surfaces the listing's own
//! API traffic as typed events.
//!
//! - [`haul_browser::session::HaulSession`]: CDP-backed browsing session
//! - [`haul_browser::session::LoadSession`]: the seam the watch loop drives
//! - [`haul_browser::scope::ScopeSet`]: URL allow-list for intercepted traffic
//! - [`haul_browser::tap`]: exchange tap publishing [`haul_browser::tap::TapEvent`]s
pub mod haul_browser;
