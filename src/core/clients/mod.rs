pub mod cost_explorer;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::cost::ReportWindow;
use crate::core::models::explorer::CostResponse;

/// Fetches per-service cost for a date range.
#[async_trait]
pub trait CostSource: Send + Sync {
    /// Daily unblended cost for `window`, grouped by service.
    async fn fetch_costs(&self, window: &ReportWindow) -> Result<CostResponse>;
}

/// Delivery acknowledgment returned by a [`Notifier`].
#[derive(Debug, Clone)]
pub struct SendAck {
    pub ok: bool,
    /// Full response body, kept for error reports.
    pub payload: serde_json::Value,
}

/// Sends a Markdown text message to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_markdown(&self, chat_id: &str, text: &str) -> Result<SendAck>;
}

/// Validate that a configured endpoint URL uses HTTPS.
///
/// Endpoint overrides carry secrets in the request (the bot token is part of the
/// path), so anything other than HTTPS is refused.
pub fn validate_endpoint(url: &str, name: &str) -> Result<()> {
    if !url.starts_with("https://") {
        anyhow::bail!("{}: endpoint must use HTTPS, got: {}", name, url);
    }
    Ok(())
}
