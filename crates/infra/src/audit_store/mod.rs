//! Append-only audit entry storage.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use stockroom_audit::{AuditEntry, AuditFilter, AuditPage, Pagination, SortOrder, UncommittedAuditEntry};

use crate::StoreError;

pub use in_memory::InMemoryAuditStore;
pub use postgres::PostgresAuditStore;

/// Append-only audit store.
///
/// Entries are never updated or deleted. `append` assigns a monotonically
/// increasing `id` used to break timestamp ties.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: UncommittedAuditEntry) -> Result<AuditEntry, StoreError>;

    /// Matching entries ordered by `(timestamp, id)` in `order`, one page at a
    /// time, with the total number of matches.
    async fn query(&self, filter: &AuditFilter, order: SortOrder, page: Pagination) -> Result<AuditPage, StoreError>;
}

#[async_trait::async_trait]
impl<S> AuditStore for Arc<S>
where
    S: AuditStore + ?Sized,
{
    async fn append(&self, entry: UncommittedAuditEntry) -> Result<AuditEntry, StoreError> {
        (**self).append(entry).await
    }

    async fn query(&self, filter: &AuditFilter, order: SortOrder, page: Pagination) -> Result<AuditPage, StoreError> {
        (**self).query(filter, order, page).await
    }
}
