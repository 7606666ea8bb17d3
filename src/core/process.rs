use crate::core::models::cost::{CostEntry, ServiceCost};

/// Services whose rounded spend is below this are left out of the report.
pub const MIN_REPORTED_AMOUNT: i64 = 10;

/// Round each amount to whole units (half away from zero), drop the small
/// ones, and order by amount descending. Ties keep their input order.
pub fn process(costs: &[ServiceCost]) -> Vec<CostEntry> {
    let mut entries: Vec<CostEntry> = costs
        .iter()
        .map(|cost| CostEntry {
            service: cost.service.clone(),
            amount: cost.amount.round() as i64,
        })
        .filter(|entry| entry.amount >= MIN_REPORTED_AMOUNT)
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| b.amount.cmp(&a.amount));
    entries
}
