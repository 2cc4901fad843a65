use crate::channels::traits::Notifier;
use crate::config::TelegramConfig;
use crate::error::{BotError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Telegram Bot API notifier bound to the single authorized chat.
pub struct TelegramNotifier {
    bot_token: Option<String>,
    chat_id: Option<i64>,
    api_base_url: String,
    max_message_chars: usize,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// # Errors
    ///
    /// Returns [`BotError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| BotError::Config(format!("cannot build telegram http client: {e}")))?;
        Ok(Self {
            bot_token: config
                .bot_token
                .as_ref()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
            chat_id: config.chat_id,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            max_message_chars: config.max_message_chars.max(1),
            client,
        })
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{token}/{method}", self.api_base_url)
    }

    async fn send_chunk(&self, token: &str, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.method_url(token, "sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await?;

        if response.status().as_u16() != 200 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            anyhow::bail!("telegram sendMessage returned {status}: {preview}");
        }
        Ok(())
    }

    /// Point the bot's webhook at `url`. Returns the API's reply body.
    pub async fn set_webhook(&self, url: &str) -> anyhow::Result<String> {
        let Some(token) = self.bot_token.as_deref() else {
            anyhow::bail!("telegram bot token is not set");
        };
        let response = self
            .client
            .get(self.method_url(token, "setWebhook"))
            .query(&[("url", url)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("telegram setWebhook returned {status}: {body}");
        }
        Ok(body)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn id(&self) -> &'static str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    async fn notify(&self, text: &str) {
        let (Some(token), Some(chat_id)) = (self.bot_token.as_deref(), self.chat_id) else {
            info!("{} not configured, skipping message", self.id());
            return;
        };

        for chunk in chunk_message(text, self.max_message_chars) {
            if let Err(e) = self.send_chunk(token, chat_id, &chunk).await {
                warn!("{} send failed: {e}", self.id());
            }
        }
    }
}

/// Byte offset of the first char that would push `text` past `max_units`
/// UTF-16 code units, or `None` if all of it fits. A leading char wider than
/// the limit is cut after, not before.
fn utf16_cut(text: &str, max_units: usize) -> Option<usize> {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return Some(if idx == 0 { ch.len_utf8() } else { idx });
        }
    }
    None
}

/// Split `text` into pieces of at most `max_units` UTF-16 code units (the
/// unit Telegram measures message length in), preferring to break after a
/// newline. Empty input yields no pieces.
pub fn chunk_message(text: &str, max_units: usize) -> Vec<String> {
    let max_units = max_units.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while let Some(limit) = utf16_cut(rest, max_units) {
        if limit == rest.len() {
            break;
        }
        let window = &rest[..limit];
        match window.rfind('\n') {
            Some(newline) if newline > 0 => {
                chunks.push(window[..newline].to_owned());
                rest = &rest[newline + 1..];
            }
            _ => {
                chunks.push(window.to_owned());
                rest = &rest[limit..];
            }
        }
    }

    if !rest.is_empty() {
        chunks.push(rest.to_owned());
    }
    chunks
}
