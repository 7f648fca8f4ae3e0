use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::Item;

/// Calendar month a report is labelled with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation("month must be between 1 and 12"));
        }
        if !(1..=9999).contains(&year) {
            return Err(DomainError::validation("year must be between 1 and 9999"));
        }
        Ok(Self { year, month })
    }

    /// Fill missing parts from `now`.
    pub fn resolve(year: Option<i32>, month: Option<u32>, now: DateTime<Utc>) -> DomainResult<Self> {
        Self::new(year.unwrap_or(now.year()), month.unwrap_or(now.month()))
    }
}

impl core::fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inventory totals plus a snapshot of every item.
///
/// The snapshot reflects current stock; the month is a label only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub report_month: String,
    pub generated_at: DateTime<Utc>,
    pub total_distinct_items: usize,
    pub total_units: i64,
    pub total_inventory_value: f64,
    pub inventory_snapshot: Vec<Item>,
}

pub fn monthly_report(month: ReportMonth, items: Vec<Item>, generated_at: DateTime<Utc>) -> MonthlyReport {
    let total_units = items.iter().map(|i| i.quantity).sum();
    let total_value: f64 = items.iter().map(Item::stock_value).sum();

    MonthlyReport {
        report_month: month.to_string(),
        generated_at,
        total_distinct_items: items.len(),
        total_units,
        total_inventory_value: (total_value * 100.0).round() / 100.0,
        inventory_snapshot: items,
    }
}
