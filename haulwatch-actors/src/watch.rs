//! The watch loop: one actor owning at most one browsing session, composing
//! setup → (poll → observe)* → stop with restart-on-failure.
//!
//! State machine: `Idle → SettingUp → Running → Stopping → Idle`, with
//! `SettingUp → Idle` on setup failure. The "keep running" flag is a
//! `CancellationToken`, so the command surface and the loop cannot lose
//! updates to each other. A transport fault while running tears the session
//! down and re-enters `SettingUp` for the same URL under the supervisor's
//! backoff; a failed setup does not retry.

use crate::actor::{Actor, Context};
use crate::deliver::LoadSink;
use crate::intercept::{Interceptor, NotifyBinding};
use crate::supervise::supervise;
use crate::system::ShutdownHandle;
use crate::{WatchMsg, WatchPhase, WatchStatus};
use anyhow::{bail, Result};
use haulwatch_drivers::haul_browser::session::{LoadSession, SessionFactory};
use haulwatch_drivers::haul_browser::tap::TapEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

const TARGET: &str = "haul.watch";

/// Poll cadence: a short settle after the refresh nudge, a longer hold
/// between cycles.
#[derive(Debug, Clone, Copy)]
pub struct CycleTiming {
    pub settle: Duration,
    pub between: Duration,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            between: Duration::from_secs(10),
        }
    }
}

pub struct WatchActor {
    factory: Arc<dyn SessionFactory>,
    sink: Arc<dyn LoadSink>,
    timing: CycleTiming,
    shutdown: ShutdownHandle,
    active: Option<ActiveWatch>,
}

struct ActiveWatch {
    url: String,
    cancel: CancellationToken,
    phase: watch::Receiver<WatchPhase>,
}

impl WatchActor {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        sink: Arc<dyn LoadSink>,
        timing: CycleTiming,
        shutdown: ShutdownHandle,
    ) -> Self {
        Self {
            factory,
            sink,
            timing,
            shutdown,
            active: None,
        }
    }

    fn begin(&mut self, ctx: &mut Context<Self>, chat_id: i64, url: String) {
        if self.active.is_some() {
            tracing::info!(target: TARGET, %url, "watch already running; start request ignored");
            return;
        }

        let cancel = CancellationToken::new();
        let (phase_tx, phase_rx) = watch::channel(WatchPhase::SettingUp);
        let phase_tx = Arc::new(phase_tx);

        let run = {
            let factory = Arc::clone(&self.factory);
            let sink = Arc::clone(&self.sink);
            let timing = self.timing;
            let cancel = cancel.clone();
            let phase = Arc::clone(&phase_tx);
            let url = url.clone();
            move || {
                let factory = Arc::clone(&factory);
                let sink = Arc::clone(&sink);
                let cancel = cancel.clone();
                let phase = Arc::clone(&phase);
                let url = url.clone();
                async move {
                    run_watch_once(factory, sink, chat_id, &url, timing, &cancel, &phase).await
                }
            }
        };

        let addr = ctx.addr();
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = supervise(run, shutdown_rx).await {
                tracing::error!(target: TARGET, error = ?e, "watch supervisor exited with error");
            }
            phase_tx.send_replace(WatchPhase::Idle);
            let _ = addr.send(WatchMsg::Ended).await;
        });

        self.active = Some(ActiveWatch {
            url,
            cancel,
            phase: phase_rx,
        });
    }

    fn status(&self) -> WatchStatus {
        match &self.active {
            Some(active) => WatchStatus {
                enabled: !active.cancel.is_cancelled(),
                phase: *active.phase.borrow(),
                url: Some(active.url.clone()),
            },
            None => WatchStatus {
                enabled: false,
                phase: WatchPhase::Idle,
                url: None,
            },
        }
    }
}

#[async_trait::async_trait]
impl Actor for WatchActor {
    type Msg = WatchMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            WatchMsg::Begin { chat_id, url } => self.begin(ctx, chat_id, url),
            WatchMsg::End => match &self.active {
                Some(active) => {
                    tracing::info!(target: TARGET, url = %active.url, "stop requested");
                    active.cancel.cancel();
                }
                None => {
                    tracing::debug!(target: TARGET, "stop requested with no active watch");
                }
            },
            WatchMsg::Status { reply } => {
                let _ = reply.send(self.status());
            }
            WatchMsg::Ended => {
                self.active = None;
            }
        }
        Ok(())
    }
}

/// One supervised pass of the watch: setup, run, teardown.
///
/// `Ok(())` means the watch is over (stopped, or setup failed and must not
/// retry); `Err` means a fault the supervisor should recover from by
/// re-entering setup for the same URL.
async fn run_watch_once(
    factory: Arc<dyn SessionFactory>,
    sink: Arc<dyn LoadSink>,
    chat_id: i64,
    url: &str,
    timing: CycleTiming,
    cancel: &CancellationToken,
    phase: &watch::Sender<WatchPhase>,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Ok(());
    }
    phase.send_replace(WatchPhase::SettingUp);

    let (mut session, tap) = match factory.open().await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(target: TARGET, error = ?e, "session open failed; watch not started");
            return Ok(());
        }
    };
    if !session.setup(url).await {
        tracing::warn!(target: TARGET, %url, "session setup failed; watch not started");
        session.stop().await;
        return Ok(());
    }

    let mut interceptor = Interceptor::new();
    interceptor.bind(NotifyBinding::new(chat_id, sink));
    phase.send_replace(WatchPhase::Running);
    tracing::info!(target: TARGET, %url, "watch running");

    let outcome = drive_cycles(session.as_mut(), tap, &mut interceptor, timing, cancel).await;

    phase.send_replace(WatchPhase::Stopping);
    // Binding first, so tap callbacks landing after this point no-op.
    interceptor.unbind();
    session.stop().await;
    outcome
}

/// The poll/observe loop. Exchange handling and cycle driving interleave in
/// one task, which is what makes the interceptor non-reentrant.
async fn drive_cycles(
    session: &mut dyn LoadSession,
    mut tap: mpsc::Receiver<TapEvent>,
    interceptor: &mut Interceptor,
    timing: CycleTiming,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut next_cycle = tokio::time::Instant::now();
    let mut saw_traffic = true; // no quiet report before the first nudge
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(target: TARGET, "watch cancelled");
                return Ok(());
            }
            maybe_event = tap.recv() => {
                let Some(event) = maybe_event else {
                    bail!("exchange tap closed while watch was running");
                };
                saw_traffic = true;
                if let Err(e) = interceptor.on_event(event).await {
                    tracing::warn!(target: TARGET, error = ?e, "exchange handling failed; skipping");
                }
            }
            _ = tokio::time::sleep_until(next_cycle) => {
                if !saw_traffic {
                    if let Err(e) = interceptor.on_event(TapEvent::Quiet).await {
                        tracing::warn!(target: TARGET, error = ?e, "quiet handling failed");
                    }
                }
                saw_traffic = false;
                tracing::info!(target: TARGET, "scraping");
                session.nudge().await?;
                tokio::time::sleep(timing.settle).await;
                next_cycle = tokio::time::Instant::now() + timing.between;
            }
        }
    }
}
