use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::{DomainError, DomainResult, ItemId};

/// Quantity below which an item counts as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

pub fn validate_quantity(quantity: i64) -> DomainResult<i64> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(quantity)
}

/// True when a change moves an item from at-or-above `threshold` to below it.
///
/// Only the downward crossing counts; staying low does not re-trigger.
pub fn crosses_low_stock(old: i64, new: i64, threshold: i64) -> bool {
    new < threshold && old >= threshold
}

/// A single applied quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChange {
    pub item_id: ItemId,
    pub old_quantity: i64,
    pub new_quantity: i64,
}

impl QuantityChange {
    pub fn crosses_low_stock(&self, threshold: i64) -> bool {
        crosses_low_stock(self.old_quantity, self.new_quantity, threshold)
    }
}

/// One row of a bulk quantity update, as submitted.
///
/// Fields are kept loose so a bad row is reported on its own instead of
/// failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRow {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub new_quantity: Value,
}

impl BulkRow {
    /// Parse into a target item and a non-negative quantity.
    pub fn validate(&self) -> DomainResult<(ItemId, i64)> {
        let raw_id = self.item_id.trim();
        if raw_id.is_empty() {
            return Err(DomainError::validation("item id cannot be empty"));
        }
        let item_id: ItemId = raw_id.parse()?;

        let quantity = match &self.new_quantity {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| DomainError::validation("quantity must be an integer"))?;

        Ok((item_id, validate_quantity(quantity)?))
    }
}

/// Per-batch outcome reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub success: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl BulkSummary {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    /// `row` is 1-based.
    pub fn record_failure(&mut self, row: usize, reason: impl core::fmt::Display) {
        self.failed += 1;
        self.errors.push(format!("Row {row}: {reason}"));
    }
}
