use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::clients::{Notifier, SendAck};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const PARSE_MODE: &str = "Markdown";

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    text: &'a str,
    chat_id: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API backed [`Notifier`].
pub struct TelegramBot {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

// The token is a credential; keep it out of logs and panics.
impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramBot {
    pub fn with_api_url(token: impl Into<String>, api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramBot {
    async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<SendAck> {
        let body = SendMessageRequest {
            text,
            chat_id,
            parse_mode: PARSE_MODE,
        };

        // The token is part of the URL; keep it out of error messages.
        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to send request to Telegram Bot API")?;

        // Failures come back as JSON with `ok: false` and a non-2xx status,
        // so the body is parsed regardless of status.
        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| {
                format!("Failed to parse Telegram response (HTTP {})", status.as_u16())
            })?;

        let ok = payload
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .with_context(|| format!("Telegram response has no boolean 'ok' field: {}", payload))?;

        debug!(status = status.as_u16(), ok, "telegram sendMessage answered");

        Ok(SendAck { ok, payload })
    }
}
