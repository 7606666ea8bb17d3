use chrono::NaiveDate;

use crate::core::models::cost::CostEntry;

pub const COST_EXPLORER_URL: &str = "https://console.aws.amazon.com/cost-reports/home?#/custom?type=daily&groupBy=Service&forecastTimeRangeOption=None&hasBlended=false&excludeTaggedResources=false&chartStyle=Stack&timeRangeOption=Last7Days&granularity=Daily&reportName=Daily%20costs&isTemplate=true&reportType=CostUsage&hasAmortized=false&excludeDiscounts=true&usageAs=usageQuantity";

/// Render the Telegram message (legacy Markdown).
///
/// ```text
/// Spends on *2024-03-14*:
/// *EC2*: 46$
/// *RDS*: 12$
///
/// Go to [AWS Cost explorer](https://console.aws.amazon.com/cost-reports/...)
/// ```
pub fn format_report(entries: &[CostEntry], date: NaiveDate) -> String {
    let mut text = format!("Spends on *{}*:\n", date.format("%Y-%m-%d"));
    for entry in entries {
        text.push_str(&format_entry(entry));
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&format!("Go to [AWS Cost explorer]({})", COST_EXPLORER_URL));
    text
}

/// Returns "*EC2*: 46$".
pub fn format_entry(entry: &CostEntry) -> String {
    format!("*{}*: {}$", entry.service, entry.amount)
}
