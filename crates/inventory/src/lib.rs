//! Inventory domain rules.
//!
//! This crate contains the business rules the HTTP layer applies to items,
//! implemented purely as deterministic logic (no IO, no HTTP, no storage).

pub mod item;
pub mod report;
pub mod stock;

pub use item::{Item, ItemPatch, NewItem};
pub use report::{monthly_report, MonthlyReport, ReportMonth};
pub use stock::{
    crosses_low_stock, validate_quantity, BulkRow, BulkSummary, QuantityChange, LOW_STOCK_THRESHOLD,
};
