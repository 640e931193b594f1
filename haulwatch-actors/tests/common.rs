#![allow(dead_code)]

use anyhow::Result;
use haulwatch_actors::deliver::LoadSink;
use haulwatch_common::load::LoadItem;
use haulwatch_common::observability::{LogConfig, LogFormat};
use haulwatch_drivers::haul_browser::tap::{InterceptedExchange, TapEvent};
use std::sync::{Mutex, OnceLock};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "haulwatch-tests",
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        haulwatch_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Sink that records `(chat_id, id)` pairs instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<(i64, String)>>,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<(i64, String)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl LoadSink for RecordingSink {
    async fn deliver(&self, chat_id: i64, item: &LoadItem) -> Result<()> {
        self.delivered
            .lock()
            .unwrap()
            .push((chat_id, item.id.to_string()));
        Ok(())
    }
}

pub fn exchange(status: i64, body: &str) -> TapEvent {
    TapEvent::Exchange(InterceptedExchange {
        request_id: "req-1".to_string(),
        url: "https://loads.ati.su/webapi/v1.0/loads/search".to_string(),
        status,
        body: body.as_bytes().to_vec(),
    })
}

pub fn raw_exchange(status: i64, body: Vec<u8>) -> TapEvent {
    TapEvent::Exchange(InterceptedExchange {
        request_id: "req-1".to_string(),
        url: "https://loads.ati.su/webapi/v1.0/loads/search".to_string(),
        status,
        body,
    })
}
