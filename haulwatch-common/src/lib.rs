//! Common types and utilities shared across Haulwatch crates.
//!
//! This crate defines the load-posting value types, the session cookie jar,
//! and observability helpers used throughout the Haulwatch workspace. It is
//! intentionally lightweight and dependency‑minimal so that all crates can
//! depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`load`]: the upstream loads-search payload model ([`load::LoadItem`],
//!   [`load::SearchPayload`])
//! - [`cookies`]: exported session cookie records and the jar loader
//! - [`observability`]: centralised tracing/logging initialisation

pub mod cookies;
pub mod load;
pub mod observability;
