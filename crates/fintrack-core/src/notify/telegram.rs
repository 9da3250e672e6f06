//! Telegram Bot API channel
//!
//! # Configuration
//!
//! Environment variables:
//! - `TELEGRAM_BOT_TOKEN`: Bot token (required)
//! - `TELEGRAM_CHAT_ID`: Target chat (required)
//! - `TELEGRAM_API_BASE`: API base URL (default: https://api.telegram.org)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::http_client;
use crate::error::{Error, Result};

use super::Notifier;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Sends operator alerts through a Telegram bot
#[derive(Clone)]
pub struct TelegramNotifier {
    http_client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token grants full control of the bot
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Self {
        Self {
            http_client: http_client(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Returns None unless both the bot token and chat id are set.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .filter(|s| !s.trim().is_empty())?;
        let api_base =
            std::env::var("TELEGRAM_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Some(Self::new(&api_base, &bot_token, &chat_id))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        let response = self
            .http_client
            .post(format!("{}/bot{}/sendMessage", self.api_base, self.bot_token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::External(format!("Telegram error {}: {}", status, body)));
        }

        // Telegram reports some failures as {"ok": false} with a 200
        let reply: SendMessageResponse = response.json().await?;
        if !reply.ok {
            return Err(Error::External(format!(
                "Telegram rejected message: {}",
                reply.description.unwrap_or_default()
            )));
        }

        debug!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}
