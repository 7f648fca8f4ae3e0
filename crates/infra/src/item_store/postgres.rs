//! Postgres-backed item store over the `items` table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_core::ItemId;
use stockroom_inventory::{Item, ItemPatch, QuantityChange};

use super::ItemStore;
use crate::error::{map_sqlx_error, StoreError};

const ITEM_COLUMNS: &str = "id, name, quantity, price, category, created_at";

#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: Arc<PgPool>,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> Result<Item, StoreError> {
    let get = |e: sqlx::Error| map_sqlx_error("decode_item_row", e);

    let id: uuid::Uuid = row.try_get("id").map_err(get)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get)?;
    Ok(Item {
        id: ItemId::from_uuid(id),
        name: row.try_get("name").map_err(get)?,
        quantity: row.try_get("quantity").map_err(get)?,
        price: row.try_get("price").map_err(get)?,
        category: row.try_get("category").map_err(get)?,
        created_at,
    })
}

#[async_trait::async_trait]
impl ItemStore for PostgresItemStore {
    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn insert(&self, item: Item) -> Result<Item, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, quantity, price, category, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.category.as_deref())
        .bind(item.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?
            .as_ref()
            .map(item_from_row)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY name ASC, id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>, StoreError> {
        let sql = format!(
            r#"
            UPDATE items SET
                name = COALESCE($2, name),
                quantity = COALESCE($3, quantity),
                price = COALESCE($4, price),
                category = COALESCE($5, category)
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        );
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(patch.name.as_deref())
            .bind(patch.quantity)
            .bind(patch.price)
            .bind(patch.category.as_deref())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_item", e))?
            .as_ref()
            .map(item_from_row)
            .transpose()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn set_quantity(&self, id: ItemId, quantity: i64) -> Result<Option<QuantityChange>, StoreError> {
        // The subquery locks the row, so the returned old value is the one replaced.
        let row = sqlx::query(
            r#"
            UPDATE items AS i
            SET quantity = $2
            FROM (SELECT id, quantity FROM items WHERE id = $1 FOR UPDATE) AS old
            WHERE i.id = old.id
            RETURNING old.quantity AS old_quantity
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_quantity", e))?;

        row.map(|row| {
            let old_quantity: i64 = row.try_get("old_quantity").map_err(|e| map_sqlx_error("set_quantity", e))?;
            Ok(QuantityChange {
                item_id: id,
                old_quantity,
                new_quantity: quantity,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("DELETE FROM items WHERE id = $1 RETURNING {ITEM_COLUMNS}");
        sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?
            .as_ref()
            .map(item_from_row)
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn below_threshold(&self, threshold: i64) -> Result<Vec<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE quantity < $1 ORDER BY quantity ASC, id ASC");
        let rows = sqlx::query(&sql)
            .bind(threshold)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("below_threshold", e))?;
        rows.iter().map(item_from_row).collect()
    }
}
