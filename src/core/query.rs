use crate::core::clients::cost_explorer::METRIC;
use crate::core::error::ReportError;
use crate::core::models::cost::ServiceCost;
use crate::core::models::explorer::{CostGroup, CostResponse};

/// Pull the per-service costs out of `ResultsByTime[0].Groups`.
///
/// A missing group list means the API contract changed (or there was no data
/// for the period) and is reported as [`ReportError::MalformedResponse`]. A
/// present but empty list is a valid day with nothing to report.
pub fn extract_groups(response: &CostResponse) -> Result<Vec<ServiceCost>, ReportError> {
    let groups = response
        .results_by_time
        .as_ref()
        .and_then(|results| results.first())
        .and_then(|first| first.groups.as_ref())
        .ok_or_else(|| ReportError::malformed(dump(response)))?;

    groups.iter().map(parse_group).collect()
}

fn parse_group(group: &CostGroup) -> Result<ServiceCost, ReportError> {
    let service = group
        .keys
        .as_ref()
        .and_then(|keys| keys.first())
        .ok_or_else(|| ReportError::malformed(format!("group without a service key: {}", dump(group))))?;

    let raw = group
        .metrics
        .as_ref()
        .and_then(|metrics| metrics.get(METRIC))
        .and_then(|metric| metric.amount.as_deref())
        .ok_or_else(|| {
            ReportError::malformed(format!("{} has no {} amount: {}", service, METRIC, dump(group)))
        })?;

    // f64 parsing also accepts "NaN" and "inf"; only finite amounts are costs.
    let amount = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| {
            ReportError::malformed(format!("{} has a non-numeric amount '{}'", service, raw))
        })?;

    Ok(ServiceCost {
        service: service.clone(),
        amount,
    })
}

fn dump<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> CostResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_groups_in_order() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "Groups": [
                { "Keys": ["EC2"], "Metrics": { "UnblendedCost": { "Amount": "45.6", "Unit": "USD" } } },
                { "Keys": ["S3"],  "Metrics": { "UnblendedCost": { "Amount": "3.2",  "Unit": "USD" } } },
                { "Keys": ["RDS"], "Metrics": { "UnblendedCost": { "Amount": "12.4", "Unit": "USD" } } }
            ] }] }"#,
        );
        let costs = extract_groups(&resp).unwrap();
        let services: Vec<&str> = costs.iter().map(|c| c.service.as_str()).collect();
        assert_eq!(services, vec!["EC2", "S3", "RDS"]);
        assert!((costs[0].amount - 45.6).abs() < 1e-10);
    }

    #[test]
    fn empty_groups_are_valid() {
        let resp = response(r#"{ "ResultsByTime": [{ "Groups": [] }] }"#);
        assert!(extract_groups(&resp).unwrap().is_empty());
    }

    #[test]
    fn missing_results_is_malformed() {
        let err = extract_groups(&response("{}")).unwrap_err();
        assert!(matches!(err, ReportError::MalformedResponse { .. }));
    }

    #[test]
    fn empty_results_is_malformed() {
        let err = extract_groups(&response(r#"{ "ResultsByTime": [] }"#)).unwrap_err();
        assert!(matches!(err, ReportError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_groups_is_malformed_and_dumps_response() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "TimePeriod": { "Start": "2024-03-14", "End": "2024-03-15" } }] }"#,
        );
        let err = extract_groups(&resp).unwrap_err();
        assert!(err.to_string().contains("2024-03-14"));
    }

    #[test]
    fn only_first_period_is_read() {
        let resp = response(
            r#"{ "ResultsByTime": [
                { "Groups": [] },
                { "Groups": [{ "Keys": ["EC2"], "Metrics": { "UnblendedCost": { "Amount": "99" } } }] }
            ] }"#,
        );
        assert!(extract_groups(&resp).unwrap().is_empty());
    }

    #[test]
    fn group_without_keys_is_malformed() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "Groups": [{ "Metrics": { "UnblendedCost": { "Amount": "1" } } }] }] }"#,
        );
        let err = extract_groups(&resp).unwrap_err();
        assert!(err.to_string().contains("service key"));
    }

    #[test]
    fn group_without_unblended_cost_is_malformed() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "Groups": [{ "Keys": ["EC2"], "Metrics": { "BlendedCost": { "Amount": "1" } } }] }] }"#,
        );
        let err = extract_groups(&resp).unwrap_err();
        assert!(err.to_string().contains("EC2 has no UnblendedCost amount"));
    }

    #[test]
    fn non_numeric_amount_is_malformed() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "Groups": [{ "Keys": ["EC2"], "Metrics": { "UnblendedCost": { "Amount": "lots" } } }] }] }"#,
        );
        let err = extract_groups(&resp).unwrap_err();
        assert!(err.to_string().contains("'lots'"));
    }

    #[test]
    fn nan_and_infinite_amounts_are_malformed() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "Infinity"] {
            let json = format!(
                r#"{{ "ResultsByTime": [{{ "Groups": [{{ "Keys": ["EC2"], "Metrics": {{ "UnblendedCost": {{ "Amount": "{}" }} }} }}] }}] }}"#,
                raw
            );
            let resp: CostResponse = serde_json::from_str(&json).unwrap();
            let err = extract_groups(&resp).unwrap_err();
            assert!(
                matches!(err, ReportError::MalformedResponse { .. }),
                "{} should be rejected",
                raw
            );
            assert!(err.to_string().contains(&format!("'{}'", raw)));
        }
    }

    #[test]
    fn tiny_scientific_amounts_parse() {
        let resp = response(
            r#"{ "ResultsByTime": [{ "Groups": [{ "Keys": ["KMS"], "Metrics": { "UnblendedCost": { "Amount": "1.2e-07" } } }] }] }"#,
        );
        let costs = extract_groups(&resp).unwrap();
        assert!(costs[0].amount > 0.0 && costs[0].amount < 1e-6);
    }
}
