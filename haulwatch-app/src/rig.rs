use anyhow::{Context, Result};
use haulwatch_actors::{
    actor::Addr,
    bot::{bot_commands, spawn_update_feeder, BotActor},
    builder::Builder,
    deliver::TelegramSink,
    rate::{RateKey, RateLimiter, RateMsg},
    watch::{CycleTiming, WatchActor},
};
use haulwatch_common::cookies::load_cookie_jar;
use haulwatch_config::HaulwatchConfig;
use haulwatch_drivers::haul_browser::scope::ScopeSet;
use haulwatch_drivers::haul_browser::session::{ChromeSessionFactory, SessionSettings};
use haulwatch_telegram::{BotApi, Glossary, GlossaryClient};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAILBOX: usize = 256;

pub struct Rig {
    builder: Builder,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
        }
    }
    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
    pub async fn run(self) -> Result<()> {
        self.builder.run_until_ctrl_c().await
    }
}

pub async fn build_from_config(r: &mut Rig, cfg: HaulwatchConfig) -> Result<()> {
    let b = r.builder_mut();
    let shutdown = b.shutdown_handle();

    let api = BotApi::new(&cfg.bot.token)?;

    // Display glossaries are best-effort: without them the notification
    // falls back to raw ids.
    let glossary = match GlossaryClient::new(&cfg.glossary.base_url) {
        Ok(client) => match client.fetch().await {
            Ok(glossary) => glossary,
            Err(e) => {
                tracing::warn!(error = ?e, "glossary fetch failed; raw ids will be shown");
                Glossary::default()
            }
        },
        Err(e) => {
            tracing::warn!(error = ?e, "glossary client unavailable; raw ids will be shown");
            Glossary::default()
        }
    };

    let cookies = load_cookie_jar(&cfg.browser.cookies_path)
        .with_context(|| format!("loading cookie jar from {}", cfg.browser.cookies_path))?;
    tracing::info!(cookies = cookies.len(), "session cookie jar loaded");

    let scopes = ScopeSet::new(&cfg.watch.scopes)?;

    // -------- infra first --------
    b.spawn::<RateLimiter, _>("rate:main", DEFAULT_MAILBOX, RateLimiter::new);
    let rate_addr: Addr<RateLimiter> = b.addr("rate:main").expect("rate addr");

    let send_key = RateKey("tg:send".to_string());
    let _ = rate_addr.try_send(RateMsg::Upsert {
        key: send_key.clone(),
        qps: 1.0, // Bot API tolerates ~1 msg/sec per chat
        burst: 5,
    });

    // -------- watch pipeline --------
    let sink = Arc::new(TelegramSink::new(
        api.clone(),
        Arc::new(glossary),
        rate_addr,
        send_key,
    ));
    let factory = Arc::new(ChromeSessionFactory::new(
        SessionSettings {
            headless: cfg.browser.headless,
            chrome_args: cfg.browser.chrome_args.clone(),
            load_timeout: Duration::from_secs(cfg.watch.load_timeout_secs),
        },
        scopes,
        cookies,
    ));
    let timing = CycleTiming {
        settle: Duration::from_secs(cfg.watch.settle_secs),
        between: Duration::from_secs(cfg.watch.between_cycles_secs),
    };

    {
        let factory = factory.clone();
        let sink = sink.clone();
        let shutdown = shutdown.clone();
        b.spawn::<WatchActor, _>("watch:main", DEFAULT_MAILBOX, move || {
            WatchActor::new(factory.clone(), sink.clone(), timing, shutdown.clone())
        });
    }
    let watch_addr: Addr<WatchActor> = b
        .registry()
        .get_addr("watch:main")
        .expect("watch addr");

    // -------- command surface last --------
    {
        let api = api.clone();
        let watch_addr = watch_addr.clone();
        b.spawn::<BotActor, _>("bot:main", DEFAULT_MAILBOX, move || {
            BotActor::new(api.clone(), watch_addr.clone())
        });
    }
    let bot_addr: Addr<BotActor> = b.addr("bot:main").expect("bot addr");

    if let Err(e) = api.set_my_commands(&bot_commands()).await {
        tracing::warn!(error = ?e, "failed to publish command menu");
    }
    spawn_update_feeder(api, bot_addr, shutdown);

    Ok(())
}
