//! Minimal wrapper around the Telegram Bot API with Haulwatch defaults.
//!
//! The bot token travels in the URL path (Telegram has no header auth), so
//! the shared HTTP client's path redaction keeps it out of the logs. Request
//! shaping stays here; transport, retries, and decode live in
//! `haulwatch-http`.
use crate::bot::types::{ApiEnvelope, BotCommand, Message, Update};
use anyhow::{Result, anyhow};
use haulwatch_http::{HttpClient, RequestOpts};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Clone)]
pub struct BotApi {
    http: HttpClient,
    token: String,
}

impl BotApi {
    pub fn new(token: &str) -> Result<Self> {
        let http = HttpClient::new("https://api.telegram.org")?;
        Ok(Self {
            http,
            token: token.to_string(),
        })
    }

    fn method_path(&self, method: &str) -> String {
        format!("bot{}/{}", self.token, method)
    }

    async fn call<T>(
        &self,
        method: &str,
        body: &serde_json::Value,
        opts: RequestOpts<'_>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let envelope: ApiEnvelope<T> = self
            .http
            .post_json(&self.method_path(method), body, opts)
            .await?;
        if !envelope.ok {
            return Err(anyhow!(
                "telegram {method} failed: {}",
                envelope.description.unwrap_or_else(|| "no details".into())
            ));
        }
        envelope
            .result
            .ok_or_else(|| anyhow!("telegram {method} returned ok without a result"))
    }

    /// Long-poll for updates past `offset`. The HTTP timeout is stretched
    /// beyond the poll window so the server, not the client, ends the wait.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = serde_json::json!({ "timeout": timeout_secs });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }
        self.call(
            "getUpdates",
            &body,
            RequestOpts {
                timeout: Some(Duration::from_secs(timeout_secs + 10)),
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
    }

    /// Send an HTML-formatted message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        self.call("sendMessage", &body, RequestOpts::default())
            .await
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        let _: bool = self
            .call("deleteMessage", &body, RequestOpts::default())
            .await?;
        Ok(())
    }

    /// Publish the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let body = serde_json::json!({ "commands": commands });
        let _: bool = self
            .call("setMyCommands", &body, RequestOpts::default())
            .await?;
        Ok(())
    }
}
