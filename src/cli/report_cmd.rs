use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use tracing::debug;

use crate::core::clients::cost_explorer::CostExplorerSource;
use crate::core::clients::telegram::TelegramBot;
use crate::core::clients::validate_endpoint;
use crate::core::config::AppConfig;
use crate::core::error_log::{self, ErrorLog};
use crate::core::models::cost::ReportWindow;
use crate::core::report;

/// Yesterday by default, or the single day asked for on the command line.
pub fn report_window(date: Option<NaiveDate>, today: NaiveDate) -> Result<ReportWindow> {
    match date {
        None => Ok(ReportWindow::yesterday(today)),
        Some(day) if day >= today => {
            anyhow::bail!("--date must be before today ({}), got {}", today, day)
        }
        Some(day) => Ok(ReportWindow::for_day(day)),
    }
}

/// Scheduled entry point. Every failure after argument parsing is appended
/// to the error log and the command still succeeds.
pub async fn run(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<()> {
    error_log::enable_backtraces();
    let window = report_window(date, Local::now().date_naive())?;
    debug!(start = %window.start, end = %window.end, "report window");

    let config = match AppConfig::load(config_path).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            ErrorLog::default().record(&e);
            return Ok(());
        }
    };
    let log = ErrorLog::new(&config.report.error_log);

    let (source, bot) = match connect(&config).await {
        Ok(clients) => clients,
        Err(e) => {
            log.record(&e);
            return Ok(());
        }
    };

    debug!(error_log = %log.path().display(), "clients ready");
    if let Some(delivery) =
        report::run_logged(window, &config.telegram.chat_id, &source, &bot, &log).await
    {
        debug!(
            day = %delivery.report.window.day(),
            reported = delivery.report.entries.len(),
            message_id = %delivery.ack.payload["result"]["message_id"],
            "run complete"
        );
    }
    Ok(())
}

/// Build and print the message without sending it. Errors go to the caller.
pub async fn preview(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<()> {
    let window = report_window(date, Local::now().date_naive())?;
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;
    let source = CostExplorerSource::from_settings(config.require_aws()?).await;
    let report = report::build(window, &source).await?;
    println!("{}", report.text);
    Ok(())
}

async fn connect(config: &AppConfig) -> Result<(CostExplorerSource, TelegramBot)> {
    let aws = config.require_aws()?;
    let telegram = config.require_telegram()?;
    validate_endpoint(&telegram.api_url, "telegram.api_url")?;
    if let Some(url) = &aws.endpoint_url {
        validate_endpoint(url, "aws.endpoint_url")?;
    }

    let bot = TelegramBot::with_api_url(telegram.bot_token.clone(), telegram.api_url.clone())?;
    let source = CostExplorerSource::from_settings(aws).await;
    Ok((source, bot))
}
