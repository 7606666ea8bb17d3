use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::operation::get_cost_and_usage::GetCostAndUsageOutput;
use aws_sdk_costexplorer::types::{
    DateInterval, Granularity, Group, GroupDefinition, GroupDefinitionType,
};
use aws_sdk_costexplorer::Client;
use tracing::debug;

use crate::core::clients::CostSource;
use crate::core::config::AwsSettings;
use crate::core::models::cost::ReportWindow;
use crate::core::models::explorer::{CostGroup, CostResponse, MetricValue, ResultByTime, TimePeriod};

pub const METRIC: &str = "UnblendedCost";
const GROUP_KEY: &str = "SERVICE";
const CREDENTIALS_SOURCE: &str = "spend-notify-config";

/// AWS Cost Explorer backed [`CostSource`].
#[derive(Debug, Clone)]
pub struct CostExplorerSource {
    client: Client,
}

impl CostExplorerSource {
    /// Build a client with the static key pair, region and optional endpoint
    /// from config.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_SOURCE,
        );
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);
        if let Some(url) = &settings.endpoint_url {
            loader = loader.endpoint_url(url.clone());
        }
        let sdk_config = loader.load().await;
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CostSource for CostExplorerSource {
    async fn fetch_costs(&self, window: &ReportWindow) -> Result<CostResponse> {
        let period = DateInterval::builder()
            .start(window.start.format("%Y-%m-%d").to_string())
            .end(window.end.format("%Y-%m-%d").to_string())
            .build()
            .context("Failed to build cost explorer time period")?;

        let group_by = GroupDefinition::builder()
            .key(GROUP_KEY)
            .r#type(GroupDefinitionType::Dimension)
            .build();

        debug!(start = %window.start, end = %window.end, "requesting cost and usage");

        let output = self
            .client
            .get_cost_and_usage()
            .time_period(period)
            .granularity(Granularity::Daily)
            .group_by(group_by)
            .metrics(METRIC)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Cost explorer request failed: {}", DisplayErrorContext(&e)))?;

        Ok(convert_output(output))
    }
}

fn convert_output(output: GetCostAndUsageOutput) -> CostResponse {
    CostResponse {
        results_by_time: output.results_by_time.map(|results| {
            results
                .into_iter()
                .map(|result| ResultByTime {
                    time_period: result.time_period.map(|p| TimePeriod {
                        start: p.start,
                        end: p.end,
                    }),
                    groups: result
                        .groups
                        .map(|groups| groups.into_iter().map(convert_group).collect()),
                    estimated: result.estimated,
                })
                .collect()
        }),
    }
}

fn convert_group(group: Group) -> CostGroup {
    CostGroup {
        keys: group.keys,
        metrics: group.metrics.map(|metrics| {
            metrics
                .into_iter()
                .map(|(name, value)| {
                    (
                        name,
                        MetricValue {
                            amount: value.amount,
                            unit: value.unit,
                        },
                    )
                })
                .collect()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_costexplorer::types::{MetricValue as SdkMetricValue, ResultByTime as SdkResultByTime};
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> CostExplorerSource {
        CostExplorerSource::from_settings(&AwsSettings {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some(server.uri()),
        })
        .await
    }

    #[tokio::test]
    async fn fetch_costs_sends_daily_service_grouped_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AWSInsightsIndexService.GetCostAndUsage"))
            .and(body_partial_json(json!({
                "TimePeriod": { "Start": "2024-02-29", "End": "2024-03-01" },
                "Granularity": "DAILY",
                "GroupBy": [{ "Type": "DIMENSION", "Key": "SERVICE" }],
                "Metrics": ["UnblendedCost"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/x-amz-json-1.1")
                    .set_body_json(json!({
                        "ResultsByTime": [{
                            "TimePeriod": { "Start": "2024-02-29", "End": "2024-03-01" },
                            "Groups": [{
                                "Keys": ["Amazon Relational Database Service"],
                                "Metrics": { "UnblendedCost": { "Amount": "12.4", "Unit": "USD" } }
                            }],
                            "Estimated": false
                        }]
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let window = ReportWindow::yesterday(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let response = source_for(&server).await.fetch_costs(&window).await.unwrap();

        let results = response.results_by_time.unwrap();
        let period = results[0].time_period.as_ref().unwrap();
        assert_eq!((period.start.as_str(), period.end.as_str()), ("2024-02-29", "2024-03-01"));
        let groups = results[0].groups.as_ref().unwrap();
        assert_eq!(groups[0].keys.as_ref().unwrap()[0], "Amazon Relational Database Service");
        let metric = &groups[0].metrics.as_ref().unwrap()[METRIC];
        assert_eq!(metric.amount.as_deref(), Some("12.4"));
    }

    #[tokio::test]
    async fn fetch_costs_surfaces_service_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("content-type", "application/x-amz-json-1.1")
                    .set_body_json(json!({
                        "__type": "DataUnavailableException",
                        "message": "Data is not available"
                    })),
            )
            .mount(&server)
            .await;

        let window = ReportWindow::for_day(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        let err = source_for(&server).await.fetch_costs(&window).await.unwrap_err();
        assert!(err.to_string().contains("Cost explorer request failed"));
        assert!(err.to_string().contains("DataUnavailable"));
    }

    #[test]
    fn convert_output_keeps_groups_and_amounts() {
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(
                SdkResultByTime::builder()
                    .groups(
                        Group::builder()
                            .keys("Amazon Simple Storage Service")
                            .metrics(
                                METRIC,
                                SdkMetricValue::builder().amount("3.2").unit("USD").build(),
                            )
                            .build(),
                    )
                    .estimated(true)
                    .build(),
            )
            .build();

        let response = convert_output(output);
        let results = response.results_by_time.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].estimated);

        let groups = results[0].groups.as_ref().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].keys.as_deref(),
            Some(&["Amazon Simple Storage Service".to_string()][..])
        );
        let metric = &groups[0].metrics.as_ref().unwrap()[METRIC];
        assert_eq!(metric.amount.as_deref(), Some("3.2"));
    }

    #[test]
    fn convert_output_preserves_absent_groups() {
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(SdkResultByTime::builder().build())
            .build();
        let response = convert_output(output);
        assert!(response.results_by_time.unwrap()[0].groups.is_none());
    }

    #[test]
    fn convert_output_preserves_absent_results() {
        let output = GetCostAndUsageOutput::builder().build();
        assert!(convert_output(output).results_by_time.is_none());
    }
}
