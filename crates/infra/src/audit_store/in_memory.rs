use std::sync::RwLock;

use stockroom_audit::{sort_entries, AuditEntry, AuditFilter, AuditPage, Pagination, SortOrder, UncommittedAuditEntry};

use super::AuditStore;
use crate::StoreError;

/// In-memory append-only audit store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry in append order.
    pub fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("audit store lock poisoned")
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: UncommittedAuditEntry) -> Result<AuditEntry, StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let next_id = entries.last().map(|e| e.id).unwrap_or(0) + 1;
        let committed = entry.commit(next_id);
        entries.push(committed.clone());
        Ok(committed)
    }

    async fn query(&self, filter: &AuditFilter, order: SortOrder, page: Pagination) -> Result<AuditPage, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut matching: Vec<AuditEntry> = entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        drop(entries);

        sort_entries(&mut matching, order);
        let total = matching.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let entries = matching
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .collect();

        Ok(AuditPage { entries, total })
    }
}
