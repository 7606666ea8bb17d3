use chrono::{Duration, NaiveDate};

/// One service's spend as reported by the cost API, before rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCost {
    pub service: String,
    pub amount: f64,
}

/// A processed line of the report: whole currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostEntry {
    pub service: String,
    pub amount: i64,
}

/// Half-open date range `[start, end)` covering exactly one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day + Duration::days(1),
        }
    }

    /// The window ending on `today`, i.e. covering yesterday.
    pub fn yesterday(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(1),
            end: today,
        }
    }

    /// The day being reported on.
    pub fn day(&self) -> NaiveDate {
        self.start
    }
}
