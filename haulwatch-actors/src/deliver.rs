//! Delivery sinks: where confirmed new loads go.

use crate::actor::Addr;
use crate::rate::{RateKey, RateLimiter, RateMsg};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use haulwatch_common::load::LoadItem;
use haulwatch_telegram::format::render_notification;
use haulwatch_telegram::{BotApi, Glossary};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Delivers a single structured item to an external destination. Safe to
/// call from the watch loop's consumer task; implementations must not panic.
#[async_trait]
pub trait LoadSink: Send + Sync {
    async fn deliver(&self, chat_id: i64, item: &LoadItem) -> Result<()>;
}

/// Renders the notification and posts it through the Bot API, pacing sends
/// through the shared token bucket.
pub struct TelegramSink {
    api: BotApi,
    glossary: Arc<Glossary>,
    rate_limiter: Addr<RateLimiter>,
    rate_key: RateKey,
}

impl TelegramSink {
    pub fn new(
        api: BotApi,
        glossary: Arc<Glossary>,
        rate_limiter: Addr<RateLimiter>,
        rate_key: RateKey,
    ) -> Self {
        Self {
            api,
            glossary,
            rate_limiter,
            rate_key,
        }
    }
}

#[async_trait]
impl LoadSink for TelegramSink {
    async fn deliver(&self, chat_id: i64, item: &LoadItem) -> Result<()> {
        let (permit_tx, permit_rx) = oneshot::channel();
        self.rate_limiter
            .send(RateMsg::Acquire {
                key: self.rate_key.clone(),
                cost: 1,
                reply: permit_tx,
            })
            .await
            .map_err(|_| anyhow!("rate limiter actor dropped"))?;
        permit_rx
            .await
            .map_err(|_| anyhow!("failed to receive rate permit from limiter"))?;

        let text = render_notification(item, &self.glossary);
        self.api.send_message(chat_id, &text).await?;
        tracing::debug!(target: "haul.deliver", chat_id, id = %item.id, "load delivered");
        Ok(())
    }
}
