//! CDP-backed browsing session for the loads listing.
//!
//! The watch loop drives sessions through the [`LoadSession`] /
//! [`SessionFactory`] seam so tests can substitute a stub; the only real
//! implementation launches Chrome via `chromiumoxide`.

use crate::haul_browser::scope::ScopeSet;
use crate::haul_browser::tap::{spawn_exchange_tap, TapEvent};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::Page;
use futures::StreamExt;
use haulwatch_common::cookies::CookieRecord;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TAP_CHANNEL_CAPACITY: usize = 64;

/// One browsing session bound to a target URL and an injected cookie set.
///
/// `setup` navigates twice with the cookie injection strictly in between:
/// the first navigation establishes the domain context cookies attach to,
/// the second re-issues the request carrying them.
#[async_trait]
pub trait LoadSession: Send {
    /// Prepare the listing page. Never panics and never propagates driver
    /// faults; a `false` return means the session is unusable.
    async fn setup(&mut self, url: &str) -> bool;

    /// Trigger one listing refresh. Driver faults propagate so the watch
    /// supervisor can tear the session down and rebuild it.
    async fn nudge(&mut self) -> Result<()>;

    /// Release the session. Safe to call at any point and more than once.
    async fn stop(&mut self);
}

/// Opens sessions together with their exchange tap.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<(Box<dyn LoadSession>, mpsc::Receiver<TapEvent>)>;
}

/// Launch parameters for the Chrome-backed session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub headless: bool,
    pub chrome_args: Vec<String>,
    /// Per-navigation budget; elapsing it is a soft timeout, not an error.
    pub load_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_args: Vec::new(),
            load_timeout: Duration::from_secs(12),
        }
    }
}

pub struct ChromeSessionFactory {
    settings: SessionSettings,
    scopes: ScopeSet,
    cookies: Vec<CookieRecord>,
}

impl ChromeSessionFactory {
    pub fn new(settings: SessionSettings, scopes: ScopeSet, cookies: Vec<CookieRecord>) -> Self {
        Self {
            settings,
            scopes,
            cookies,
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<(Box<dyn LoadSession>, mpsc::Receiver<TapEvent>)> {
        let mut builder = BrowserConfig::builder();
        if !self.settings.headless {
            builder = builder.with_head();
        }
        for arg in &self.settings.chrome_args {
            builder = builder.arg(arg);
        }
        let config = builder.build().map_err(|e| anyhow!(e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        page.execute(EnableParams::default())
            .await
            .context("failed to enable network domain")?;

        let (tx, rx) = mpsc::channel(TAP_CHANNEL_CAPACITY);
        let tap_task = spawn_exchange_tap(&page, self.scopes.clone(), tx).await?;

        let session = HaulSession {
            browser: Some(browser),
            page,
            handler_task,
            tap_task,
            cookies: self.cookies.clone(),
            load_timeout: self.settings.load_timeout,
        };
        Ok((Box::new(session), rx))
    }
}

/// Chrome session wrapper. Owns the browser process for its lifetime.
pub struct HaulSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    tap_task: JoinHandle<()>,
    cookies: Vec<CookieRecord>,
    load_timeout: Duration,
}

impl HaulSession {
    /// Navigate within the load budget. Elapsing the budget is good enough
    /// to proceed; only driver-level faults are errors.
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::info!(target: "haul.session", %url, "navigating");
        match tokio::time::timeout(self.load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(anyhow!(e).context("navigation failed")),
            Err(_) => {
                tracing::info!(
                    target: "haul.session",
                    %url,
                    "page load stopped by timeout, continuing"
                );
                Ok(())
            }
        }
    }

    async fn inject_cookies(&self) -> Result<()> {
        if self.cookies.is_empty() {
            return Ok(());
        }
        let mut params = Vec::with_capacity(self.cookies.len());
        for record in &self.cookies {
            let mut b = CookieParam::builder()
                .name(record.name.clone())
                .value(record.value.clone());
            if let Some(domain) = &record.domain {
                b = b.domain(domain.clone());
            }
            if let Some(path) = &record.path {
                b = b.path(path.clone());
            }
            if let Some(secure) = record.secure {
                b = b.secure(secure);
            }
            if let Some(http_only) = record.http_only {
                b = b.http_only(http_only);
            }
            if let Some(expiry) = record.expiry {
                b = b.expires(TimeSinceEpoch::new(expiry));
            }
            params.push(b.build().map_err(|e| anyhow!(e))?);
        }
        self.page
            .execute(SetCookiesParams::new(params))
            .await
            .context("Network.setCookies")?;
        Ok(())
    }
}

#[async_trait]
impl LoadSession for HaulSession {
    async fn setup(&mut self, url: &str) -> bool {
        if let Err(e) = self.goto(url).await {
            tracing::error!(target: "haul.session", error = ?e, "setup navigation failed");
            return false;
        }
        if let Err(e) = self.inject_cookies().await {
            tracing::error!(target: "haul.session", error = ?e, "cookie injection failed");
            return false;
        }
        tracing::info!(target: "haul.session", "cookies injected");
        if let Err(e) = self.goto(url).await {
            tracing::error!(target: "haul.session", error = ?e, "authenticated navigation failed");
            return false;
        }
        tracing::info!(target: "haul.session", "listing page ready");
        true
    }

    async fn nudge(&mut self) -> Result<()> {
        self.page
            .find_element("body")
            .await
            .context("listing document missing")?
            .press_key("Enter")
            .await
            .context("refresh keystroke failed")?;
        tracing::info!(target: "haul.session", "loads update requested");
        Ok(())
    }

    async fn stop(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        tracing::info!(target: "haul.session", "driver stopping");
        self.tap_task.abort();
        if let Err(e) = browser.close().await {
            tracing::debug!(target: "haul.session", error = ?e, "browser close");
        }
        let _ = browser.wait().await;
        self.handler_task.abort();
    }
}
