//! Per-item quantity history rebuilt from the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::ItemId;

use crate::{AuditAction, AuditEntry};

/// A quantity time series, shaped for charting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub labels: Vec<DateTime<Utc>>,
    pub quantities: Vec<i64>,
}

impl Trend {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    // Same-instant points collapse to the last value seen.
    fn push(&mut self, at: DateTime<Utc>, quantity: i64) {
        if self.labels.last() == Some(&at) {
            if let Some(last) = self.quantities.last_mut() {
                *last = quantity;
            }
        } else {
            self.labels.push(at);
            self.quantities.push(quantity);
        }
    }
}

/// Current state of an item, used when it has no audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFallback {
    pub created_at: DateTime<Utc>,
    pub quantity: i64,
}

/// Rebuild the quantity series for `item_id`.
///
/// Entries are processed in `(timestamp, id)` order regardless of input order.
/// Entries that are not quantity changes for this item are ignored. When no
/// point can be produced the series falls back to a single point from
/// `fallback`, or stays empty when the item does not exist.
pub fn reconstruct_trend(item_id: ItemId, entries: &[AuditEntry], fallback: Option<TrendFallback>) -> Trend {
    let record = item_id.to_string();

    let mut ordered: Vec<&AuditEntry> = entries
        .iter()
        .filter(|e| AuditAction::QUANTITY_CHANGES.contains(&e.action))
        .collect();
    ordered.sort_by_key(|e| (e.timestamp, e.id));

    let mut trend = Trend::default();
    for entry in ordered {
        let Some(raw) = quantity_in(entry, &record) else {
            continue;
        };
        match as_quantity(raw) {
            Some(quantity) => trend.push(entry.timestamp, quantity),
            None => tracing::warn!(
                item_id = %item_id,
                audit_id = entry.id,
                "could not parse quantity '{raw}' at {}",
                entry.timestamp
            ),
        }
    }

    if trend.is_empty() {
        if let Some(fb) = fallback {
            trend.push(fb.created_at, fb.quantity);
        }
    }
    trend
}

fn quantity_in<'a>(entry: &'a AuditEntry, record: &str) -> Option<&'a Value> {
    let values = entry.new_values.as_ref()?.as_object()?;

    if let Some(quantity) = values.get("quantity") {
        return (entry.record_id.as_deref() == Some(record)).then_some(quantity);
    }

    if entry.action.is_bulk() {
        return values
            .get("updated_items")?
            .as_array()?
            .iter()
            .find(|row| row.get("item_id").and_then(Value::as_str) == Some(record))?
            .get("new_quantity");
    }

    None
}

fn as_quantity(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
