//! Telegram command surface: maps chat commands onto watch-loop messages and
//! feeds long-polled updates into the actor system.

use crate::actor::{Actor, Addr, Context};
use crate::system::ShutdownHandle;
use crate::watch::WatchActor;
use crate::WatchMsg;
use anyhow::Result;
use haulwatch_telegram::bot::types::{BotCommand, Message, Update};
use haulwatch_telegram::BotApi;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const TARGET: &str = "haul.bot";
const UPDATE_POLL_SECS: u64 = 25;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCmd {
    Start,  // /start
    Stop,   // /stop
    Status, // /status
}

/// Parse a leading slash-command, tolerating the `/cmd@BotName` form group
/// chats produce.
pub fn parse_command(input: &str) -> Option<BotCmd> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let verb = trimmed.split_whitespace().next().unwrap_or_default();
    let verb = verb.split('@').next().unwrap_or(verb);

    match verb {
        "/start" => Some(BotCmd::Start),
        "/stop" => Some(BotCmd::Stop),
        "/status" => Some(BotCmd::Status),
        _ => None,
    }
}

/// The command menu published via `setMyCommands` at startup.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Запустить бота"),
        BotCommand::new("stop", "Остановить уведомления"),
        BotCommand::new("status", "Проверить статус"),
    ]
}

pub struct BotActor {
    api: BotApi,
    watch: Addr<WatchActor>,
}

impl BotActor {
    pub fn new(api: BotApi, watch: Addr<WatchActor>) -> Self {
        Self { api, watch }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.api.send_message(chat_id, text).await {
            tracing::warn!(target: TARGET, chat_id, error = ?e, "reply failed");
        }
    }

    async fn handle_link(&self, message: Message) {
        let Some(url) = message.first_url() else {
            return;
        };
        let chat_id = message.chat.id;
        self.reply(chat_id, "Разбираю ссылку…").await;
        if let Err(e) = self
            .api
            .delete_message(chat_id, message.message_id)
            .await
        {
            tracing::debug!(target: TARGET, error = ?e, "could not delete link message");
        }
        if self
            .watch
            .send(WatchMsg::Begin { chat_id, url })
            .await
            .is_err()
        {
            tracing::error!(target: TARGET, "watch actor mailbox dropped");
        }
    }
}

#[async_trait::async_trait]
impl Actor for BotActor {
    type Msg = Update;

    async fn handle(&mut self, update: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        match message.text.as_deref().and_then(parse_command) {
            Some(BotCmd::Start) => {
                self.reply(chat_id, "Введите ссылку:").await;
            }
            Some(BotCmd::Stop) => {
                if self.watch.send(WatchMsg::End).await.is_err() {
                    tracing::error!(target: TARGET, "watch actor mailbox dropped");
                }
                self.reply(chat_id, "Парсер остановлен").await;
            }
            Some(BotCmd::Status) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if self
                    .watch
                    .send(WatchMsg::Status { reply: reply_tx })
                    .await
                    .is_err()
                {
                    tracing::error!(target: TARGET, "watch actor mailbox dropped");
                    return Ok(());
                }
                let enabled = reply_rx.await.map(|s| s.enabled).unwrap_or(false);
                let text = if enabled {
                    "Уведомления включены"
                } else {
                    "Уведомления отключены"
                };
                self.reply(chat_id, text).await;
            }
            None => self.handle_link(message).await,
        }
        Ok(())
    }
}

/// Long-poll `getUpdates` and forward each update to the bot actor,
/// advancing the acknowledgement offset as we go. Transport errors pause
/// briefly and resume; the feeder only exits on shutdown or when the actor
/// is gone.
pub fn spawn_update_feeder(
    api: BotApi,
    bot: Addr<BotActor>,
    shutdown: ShutdownHandle,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let mut offset: Option<i64> = None;
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                polled = api.get_updates(offset, UPDATE_POLL_SECS) => {
                    match polled {
                        Ok(updates) => {
                            for update in updates {
                                offset = Some(update.update_id + 1);
                                if bot.send(update).await.is_err() {
                                    tracing::warn!(target: TARGET, "bot actor gone; stopping feeder");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(target: TARGET, error = ?e, "update polling failed; retrying");
                            tokio::time::sleep(POLL_RETRY_DELAY).await;
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("/start"), Some(BotCmd::Start));
        assert_eq!(parse_command("/stop"), Some(BotCmd::Stop));
        assert_eq!(parse_command("/status"), Some(BotCmd::Status));
        assert_eq!(parse_command("  /status  "), Some(BotCmd::Status));
    }

    #[test]
    fn group_chat_mentions_parse() {
        assert_eq!(parse_command("/status@HaulwatchBot"), Some(BotCmd::Status));
    }

    #[test]
    fn non_commands_do_not_parse() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("https://loads.ati.su/"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
    }
}
