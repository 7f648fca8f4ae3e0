//! Inventory item persistence.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use stockroom_core::ItemId;
use stockroom_inventory::{Item, ItemPatch, QuantityChange};

use crate::StoreError;

pub use in_memory::InMemoryItemStore;
pub use postgres::PostgresItemStore;

/// Store of inventory items.
///
/// Lookups and mutations of a missing item return `Ok(None)`; errors are
/// reserved for the store itself failing.
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, item: Item) -> Result<Item, StoreError>;

    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Every item, ordered by name.
    async fn list(&self) -> Result<Vec<Item>, StoreError>;

    /// Apply a validated patch and return the updated item.
    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, StoreError>;

    /// Replace the quantity, returning the old and new values read atomically.
    async fn set_quantity(&self, id: ItemId, quantity: i64) -> Result<Option<QuantityChange>, StoreError>;

    /// Remove the item and return what was removed.
    async fn delete(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Items with `quantity < threshold`, lowest quantity first.
    async fn below_threshold(&self, threshold: i64) -> Result<Vec<Item>, StoreError>;
}

#[async_trait::async_trait]
impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    async fn insert(&self, item: Item) -> Result<Item, StoreError> {
        (**self).insert(item).await
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list().await
    }

    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, StoreError> {
        (**self).update(id, patch).await
    }

    async fn set_quantity(&self, id: ItemId, quantity: i64) -> Result<Option<QuantityChange>, StoreError> {
        (**self).set_quantity(id, quantity).await
    }

    async fn delete(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).delete(id).await
    }

    async fn below_threshold(&self, threshold: i64) -> Result<Vec<Item>, StoreError> {
        (**self).below_threshold(threshold).await
    }
}
