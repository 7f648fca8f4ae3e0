//! Quantity trend for a single item, read from the audit trail.

use stockroom_audit::{reconstruct_trend, AuditAction, AuditFilter, Pagination, SortOrder, Trend, TrendFallback};
use stockroom_core::ItemId;

use crate::{AuditStore, ItemStore, StoreError};

/// Audit table name used for item entries.
pub const ITEMS_TABLE: &str = "items";

/// Rebuild the quantity series for `item_id`.
///
/// Falls back to the item's creation point when it has no usable history, and
/// returns an empty series when the item does not exist.
pub async fn item_trend(
    audit: &dyn AuditStore,
    items: &dyn ItemStore,
    item_id: ItemId,
) -> Result<Trend, StoreError> {
    let filter = AuditFilter {
        table_name: Some(ITEMS_TABLE.to_string()),
        record_id: Some(item_id.to_string()),
        actions: Some(AuditAction::QUANTITY_CHANGES.to_vec()),
        ..Default::default()
    };
    let history = audit
        .query(&filter, SortOrder::Ascending, Pagination::everything())
        .await?;

    let trend = reconstruct_trend(item_id, &history.entries, None);
    if !trend.is_empty() {
        return Ok(trend);
    }

    let fallback = items.get(item_id).await?.map(|item| TrendFallback {
        created_at: item.created_at,
        quantity: item.quantity,
    });
    tracing::debug!(item_id = %item_id, found = fallback.is_some(), "no quantity history, using item state");
    Ok(reconstruct_trend(item_id, &[], fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryAuditStore, InMemoryItemStore};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use stockroom_audit::{AuditContext, AuditEntryDraft};
    use stockroom_inventory::{Item, NewItem};

    #[tokio::test]
    async fn history_wins_over_current_state() {
        let audit = InMemoryAuditStore::new();
        let items = InMemoryItemStore::new();
        let item = items
            .insert(Item::create(ItemId::new(), NewItem::new("gear", 3, 1.0, None).unwrap(), Utc::now()))
            .await
            .unwrap();

        let ctx = AuditContext::system("127.0.0.1");
        let t0 = Utc::now() - Duration::minutes(10);
        for (i, (action, qty)) in [
            (AuditAction::CreateItem, 5),
            (AuditAction::UpdateQuantity, 12),
            (AuditAction::UpdateQuantity, 3),
        ]
        .into_iter()
        .enumerate()
        {
            audit
                .append(
                    AuditEntryDraft::new(action)
                        .table(ITEMS_TABLE)
                        .record(item.id)
                        .new_values(json!({"quantity": qty}))
                        .stamp(&ctx, t0 + Duration::minutes(i as i64)),
                )
                .await
                .unwrap();
        }

        let trend = item_trend(&audit, &items, item.id).await.unwrap();
        assert_eq!(trend.quantities, vec![5, 12, 3]);
    }

    #[tokio::test]
    async fn falls_back_then_empties() {
        let audit = InMemoryAuditStore::new();
        let items = InMemoryItemStore::new();
        let item = items
            .insert(Item::create(ItemId::new(), NewItem::new("cog", 8, 1.0, None).unwrap(), Utc::now()))
            .await
            .unwrap();

        let trend = item_trend(&audit, &items, item.id).await.unwrap();
        assert_eq!(trend.labels, vec![item.created_at]);
        assert_eq!(trend.quantities, vec![8]);

        assert!(item_trend(&audit, &items, ItemId::new()).await.unwrap().is_empty());
    }
}
