//! Exchange tap: turns the page's CDP network events into typed events on a
//! bounded channel.
//!
//! The tap is the only producer; the watch loop is the only consumer. That
//! single-consumer channel is what gives the interceptor its ordering and
//! non-reentrancy guarantees. When the consumer drops the receiver the tap
//! task winds down on its next send.

use crate::haul_browser::scope::ScopeSet;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One observed request/response pair. Ephemeral: exists only while the
/// interceptor handles it.
#[derive(Debug, Clone)]
pub struct InterceptedExchange {
    pub request_id: String,
    pub url: String,
    pub status: i64,
    pub body: Vec<u8>,
}

/// What the tap publishes towards the interceptor.
#[derive(Debug, Clone)]
pub enum TapEvent {
    /// A scope-matched response, body attached when it could be fetched.
    Exchange(InterceptedExchange),
    /// A scope-matched request whose response has not resolved yet.
    Request { request_id: String, url: String },
    /// A poll cycle elapsed with no matching traffic.
    Quiet,
}

/// Subscribe to the page's network events and start the tap task.
pub async fn spawn_exchange_tap(
    page: &Page,
    scopes: ScopeSet,
    tx: mpsc::Sender<TapEvent>,
) -> Result<JoinHandle<()>> {
    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("subscribing to request events")?;
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("subscribing to response events")?;
    let page = page.clone();

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_req = requests.next() => {
                    let Some(ev) = maybe_req else { break };
                    let url = ev.request.url.clone();
                    if !scopes.matches(&url) {
                        continue;
                    }
                    let event = TapEvent::Request {
                        request_id: ev.request_id.inner().clone(),
                        url,
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                maybe_resp = responses.next() => {
                    let Some(ev) = maybe_resp else { break };
                    let url = ev.response.url.clone();
                    if !scopes.matches(&url) {
                        continue;
                    }
                    let status = ev.response.status;
                    let body = if status == 200 {
                        match fetch_body(&page, ev.request_id.clone()).await {
                            Ok(body) => body,
                            Err(e) => {
                                tracing::warn!(
                                    target: "haul.tap",
                                    %url,
                                    error = ?e,
                                    "response body unavailable"
                                );
                                Vec::new()
                            }
                        }
                    } else {
                        // The status gate lives in the interceptor; no point
                        // pulling bodies it will discard.
                        Vec::new()
                    };
                    let event = TapEvent::Exchange(InterceptedExchange {
                        request_id: ev.request_id.inner().clone(),
                        url,
                        status,
                        body,
                    });
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(target: "haul.tap", "exchange tap stopped");
    }))
}

async fn fetch_body(page: &Page, request_id: RequestId) -> Result<Vec<u8>> {
    let resp = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .context("Network.getResponseBody")?;
    let returns = resp.result;
    if returns.base64_encoded {
        BASE64
            .decode(returns.body.as_bytes())
            .context("base64 response body")
    } else {
        Ok(returns.body.into_bytes())
    }
}
