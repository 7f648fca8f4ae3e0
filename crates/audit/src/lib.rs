//! `stockroom-audit`: the audit trail's data model.
//!
//! Audit entries are:
//! - **immutable** (treat them as facts)
//! - **append-only** (never updated or deleted)
//! - tagged with an action from a **stable vocabulary** that downstream
//!   consumers (listings, trend reconstruction) depend on
//!
//! Storage and the best-effort recorder live in `stockroom-infra`.

pub mod action;
pub mod entry;
pub mod query;
pub mod trend;

pub use action::{AuditAction, UnknownAction};
pub use entry::{AuditContext, AuditEntry, AuditEntryDraft, UncommittedAuditEntry};
pub use query::{sort_entries, AuditFilter, AuditPage, Pagination, SortOrder};
pub use trend::{reconstruct_trend, Trend, TrendFallback};
