use anyhow::{Context, Result};
use tracing::info;

use crate::core::clients::{CostSource, Notifier, SendAck};
use crate::core::error::ReportError;
use crate::core::error_log::ErrorLog;
use crate::core::formatter::format_report;
use crate::core::models::cost::{CostEntry, ReportWindow};
use crate::core::process::process;
use crate::core::query::extract_groups;

/// A rendered report, ready to send.
#[derive(Debug, Clone)]
pub struct Report {
    pub window: ReportWindow,
    pub entries: Vec<CostEntry>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub report: Report,
    pub ack: SendAck,
}

/// Query, validate, process and format. No delivery.
pub async fn build(window: ReportWindow, source: &dyn CostSource) -> Result<Report> {
    let response = source
        .fetch_costs(&window)
        .await
        .context("Failed to fetch cost data")?;
    let costs = extract_groups(&response)?;
    let entries = process(&costs);
    info!(
        day = %window.day(),
        services = costs.len(),
        reported = entries.len(),
        "cost data processed"
    );
    let text = format_report(&entries, window.day());
    Ok(Report {
        window,
        entries,
        text,
    })
}

/// Send `text` and check the acknowledgment.
pub async fn notify(chat_id: &str, text: &str, notifier: &dyn Notifier) -> Result<SendAck> {
    let ack = notifier
        .send_markdown(chat_id, text)
        .await
        .context("Failed to deliver report")?;
    if !ack.ok {
        let payload = serde_json::to_string_pretty(&ack.payload)
            .unwrap_or_else(|_| ack.payload.to_string());
        return Err(ReportError::DeliveryFailed {
            text: text.to_string(),
            chat_id: chat_id.to_string(),
            payload,
        }
        .into());
    }
    info!(chat_id, "report delivered");
    Ok(ack)
}

/// The whole pipeline; the first failing step ends the run.
pub async fn run(
    window: ReportWindow,
    chat_id: &str,
    source: &dyn CostSource,
    notifier: &dyn Notifier,
) -> Result<Delivery> {
    let report = build(window, source).await?;
    let ack = notify(chat_id, &report.text, notifier).await?;
    Ok(Delivery { report, ack })
}

/// Run the pipeline and record a failure in `log`. Never fails.
pub async fn run_logged(
    window: ReportWindow,
    chat_id: &str,
    source: &dyn CostSource,
    notifier: &dyn Notifier,
    log: &ErrorLog,
) -> Option<Delivery> {
    match run(window, chat_id, source, notifier).await {
        Ok(delivery) => Some(delivery),
        Err(e) => {
            log.record(&e);
            None
        }
    }
}
