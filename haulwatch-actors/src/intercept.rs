//! The interceptor: decides, per observed exchange, whether a genuinely new
//! load appeared, and fires the notification exactly once when it did.
//!
//! Promoted (`priority`) listings are pinned to the top of the listing
//! regardless of recency, so they are skipped before "the first load" is
//! taken — otherwise the dedup cell would latch onto a pinned item and
//! organic postings would never notify.

use crate::deliver::LoadSink;
use anyhow::{Context as _, Result};
use haulwatch_common::load::{LoadId, SearchPayload};
use haulwatch_drivers::haul_browser::tap::{InterceptedExchange, TapEvent};
use std::sync::Arc;

const TARGET: &str = "haul.intercept";

/// Destination identity paired with its delivery function. Immutable once
/// constructed; one per active watch.
pub struct NotifyBinding {
    chat_id: i64,
    sink: Arc<dyn LoadSink>,
}

impl NotifyBinding {
    pub fn new(chat_id: i64, sink: Arc<dyn LoadSink>) -> Self {
        Self { chat_id, sink }
    }
}

/// Single-writer dedup state plus the optional notify binding.
///
/// Not reentrant: the watch loop drives it from one task, one event at a
/// time, and each event's handling (including delivery) completes before the
/// next begins.
#[derive(Default)]
pub struct Interceptor {
    last_seen: Option<LoadId>,
    binding: Option<NotifyBinding>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the notify binding.
    pub fn bind(&mut self, binding: NotifyBinding) {
        self.binding = Some(binding);
    }

    /// Remove the binding; subsequent matches log and no-op.
    pub fn unbind(&mut self) {
        self.binding = None;
    }

    pub fn last_seen(&self) -> Option<&LoadId> {
        self.last_seen.as_ref()
    }

    /// Handle one tap event. An `Err` is scoped to this event: the caller
    /// logs it and moves on; dedup state is only ever mutated on a confirmed
    /// new load.
    pub async fn on_event(&mut self, event: TapEvent) -> Result<()> {
        match event {
            TapEvent::Quiet => {
                tracing::info!(target: TARGET, "no updates observed");
                Ok(())
            }
            TapEvent::Request { request_id, url } => {
                tracing::info!(target: TARGET, %request_id, %url, "request observed");
                Ok(())
            }
            TapEvent::Exchange(exchange) => self.on_exchange(exchange).await,
        }
    }

    async fn on_exchange(&mut self, exchange: InterceptedExchange) -> Result<()> {
        tracing::info!(
            target: TARGET,
            request_id = %exchange.request_id,
            url = %exchange.url,
            status = exchange.status,
            "response observed"
        );

        if exchange.status != 200 {
            tracing::warn!(target: TARGET, status = exchange.status, "response error");
            return Ok(());
        }

        let Some((chat_id, sink)) = self
            .binding
            .as_ref()
            .map(|b| (b.chat_id, Arc::clone(&b.sink)))
        else {
            tracing::warn!(
                target: TARGET,
                "no notify binding installed; dropping load data"
            );
            return Ok(());
        };

        let body =
            std::str::from_utf8(&exchange.body).context("response body is not valid UTF-8")?;
        let payload: SearchPayload =
            serde_json::from_str(body).context("malformed loads payload")?;

        let Some(candidate) = payload.first_organic() else {
            tracing::debug!(target: TARGET, "listing holds only promoted loads");
            return Ok(());
        };

        if self.last_seen.as_ref() == Some(&candidate.id) {
            tracing::info!(target: TARGET, "no new loads");
            return Ok(());
        }

        tracing::info!(target: TARGET, id = %candidate.id, "new load found");
        self.last_seen = Some(candidate.id.clone());
        if let Err(e) = sink.deliver(chat_id, candidate).await {
            // Fire-and-forget delivery: a lost notification must not stall
            // the watch or re-trigger on the same id.
            tracing::warn!(target: TARGET, error = ?e, "notification delivery failed");
        }
        Ok(())
    }
}
