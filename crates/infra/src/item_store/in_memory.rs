use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_core::ItemId;
use stockroom_inventory::{Item, ItemPatch, QuantityChange};

use super::ItemStore;
use crate::StoreError;

/// In-memory item store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("item store lock poisoned")
}

fn sorted_by(mut items: Vec<Item>, key: impl Fn(&Item, &Item) -> std::cmp::Ordering) -> Vec<Item> {
    items.sort_by(|a, b| key(a, b).then(a.id.cmp(&b.id)));
    items
}

#[async_trait::async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert(&self, item: Item) -> Result<Item, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(sorted_by(items.values().cloned().collect(), |a, b| a.name.cmp(&b.name)))
    }

    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        Ok(items.get_mut(&id).map(|item| {
            *item = item.patched(patch);
            item.clone()
        }))
    }

    async fn set_quantity(&self, id: ItemId, quantity: i64) -> Result<Option<QuantityChange>, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        Ok(items.get_mut(&id).map(|item| {
            let old_quantity = item.quantity;
            item.quantity = quantity;
            QuantityChange {
                item_id: id,
                old_quantity,
                new_quantity: quantity,
            }
        }))
    }

    async fn delete(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        Ok(items.remove(&id))
    }

    async fn below_threshold(&self, threshold: i64) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        let low = items.values().filter(|i| i.is_below(threshold)).cloned().collect();
        Ok(sorted_by(low, |a, b| a.quantity.cmp(&b.quantity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_inventory::NewItem;

    fn item(name: &str, quantity: i64) -> Item {
        Item::create(ItemId::new(), NewItem::new(name, quantity, 1.0, None).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn set_quantity_reports_previous_value() {
        let store = InMemoryItemStore::new();
        let bolt = store.insert(item("bolt", 15)).await.unwrap();

        let change = store.set_quantity(bolt.id, 5).await.unwrap().unwrap();
        assert_eq!((change.old_quantity, change.new_quantity), (15, 5));
        assert_eq!(store.get(bolt.id).await.unwrap().unwrap().quantity, 5);
        assert!(store.set_quantity(ItemId::new(), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_orders() {
        let store = InMemoryItemStore::new();
        for (name, qty) in [("nut", 3), ("bolt", 12), ("washer", 1)] {
            store.insert(item(name, qty)).await.unwrap();
        }

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["bolt", "nut", "washer"]);

        let low: Vec<i64> = store.below_threshold(10).await.unwrap().into_iter().map(|i| i.quantity).collect();
        assert_eq!(low, vec![1, 3]);
    }

    #[tokio::test]
    async fn delete_returns_removed_item() {
        let store = InMemoryItemStore::new();
        let nut = store.insert(item("nut", 3)).await.unwrap();
        assert_eq!(store.delete(nut.id).await.unwrap(), Some(nut.clone()));
        assert_eq!(store.delete(nut.id).await.unwrap(), None);
    }
}
