//! Best-effort audit recorder.
//!
//! Recording never fails the caller: the triggering operation has already
//! happened, so a store failure is logged and the entry is lost. There is no
//! retry or outbox; the trail is analytics-grade, not compliance-grade.

use std::sync::Arc;

use chrono::Utc;

use stockroom_audit::{AuditContext, AuditEntryDraft};

use crate::AuditStore;

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Stamp `draft` with the actor, source address and current time, then append it.
    pub async fn record(&self, ctx: &AuditContext, draft: AuditEntryDraft) {
        if ctx.user_id.is_none() {
            tracing::warn!(action = %draft.action, "audit entry recorded without a user id");
        }

        let action = draft.action;
        match self.store.append(draft.stamp(ctx, Utc::now())).await {
            Ok(entry) => tracing::debug!(
                audit_id = entry.id,
                %action,
                record_id = entry.record_id.as_deref().unwrap_or("-"),
                "audit entry recorded"
            ),
            Err(e) => tracing::error!(%action, "failed to record audit entry: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_store::InMemoryAuditStore;
    use stockroom_audit::{AuditAction, AuditEntry, AuditFilter, AuditPage, Pagination, SortOrder, UncommittedAuditEntry};
    use stockroom_core::UserId;

    use crate::StoreError;

    struct BrokenStore;

    #[async_trait::async_trait]
    impl AuditStore for BrokenStore {
        async fn append(&self, _entry: UncommittedAuditEntry) -> Result<AuditEntry, StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }

        async fn query(&self, _f: &AuditFilter, _o: SortOrder, _p: Pagination) -> Result<AuditPage, StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let log = AuditLog::new(Arc::new(BrokenStore));
        log.record(&AuditContext::system("127.0.0.1"), AuditEntryDraft::new(AuditAction::DeleteItem))
            .await;
    }

    #[tokio::test]
    async fn entries_without_actor_are_still_written() {
        let store = Arc::new(InMemoryAuditStore::new());
        let log = AuditLog::new(store.clone());

        log.record(
            &AuditContext::system("10.1.1.1"),
            AuditEntryDraft::new(AuditAction::GenerateMonthlyReport),
        )
        .await;
        log.record(
            &AuditContext {
                user_id: Some(UserId::new()),
                ip_address: "10.1.1.2".to_string(),
            },
            AuditEntryDraft::new(AuditAction::CreateItem),
        )
        .await;

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert!(all[0].user_id.is_none());
        assert_eq!(all[0].ip_address, "10.1.1.1");
        assert!(all[1].user_id.is_some());
    }
}
