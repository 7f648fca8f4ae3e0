//! Postgres-backed audit store.
//!
//! Rows live in `audit_log`; `id` is a `BIGSERIAL`, so append order is the
//! tie-breaker for equal timestamps. Optional filters use the
//! `($n IS NULL OR column = $n)` pattern so every query is a single
//! parameterized statement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_audit::{AuditAction, AuditEntry, AuditFilter, AuditPage, Pagination, SortOrder, UncommittedAuditEntry};
use stockroom_core::UserId;

use super::AuditStore;
use crate::error::{map_sqlx_error, StoreError};

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::uuid IS NULL OR user_id = $1)
      AND ($2::text IS NULL OR action = $2)
      AND ($3::text[] IS NULL OR action = ANY($3))
      AND ($4::text IS NULL OR table_name = $4)
      AND ($5::text IS NULL OR record_id = $5)
      AND ($6::timestamptz IS NULL OR "timestamp" >= $6)
      AND ($7::timestamptz IS NULL OR "timestamp" <= $7)
"#;

const SELECT_COLUMNS: &str =
    r#"SELECT id, user_id, action, table_name, record_id, old_values, new_values, "timestamp", ip_address FROM audit_log"#;

#[derive(Debug, Clone)]
pub struct PostgresAuditStore {
    pool: Arc<PgPool>,
}

impl PostgresAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Descending => r#"ORDER BY "timestamp" DESC, id DESC"#,
        SortOrder::Ascending => r#"ORDER BY "timestamp" ASC, id ASC"#,
    }
}

fn bind_filter<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    filter: &'q AuditFilter,
    actions: &'q Option<Vec<String>>,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(filter.user_id.map(|u| *u.as_uuid()))
        .bind(filter.action.map(|a| a.as_str()))
        .bind(actions.as_deref())
        .bind(filter.table_name.as_deref())
        .bind(filter.record_id.as_deref())
        .bind(filter.start)
        .bind(filter.end)
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> Result<AuditEntry, StoreError> {
    let get = |e: sqlx::Error| map_sqlx_error("decode_audit_row", e);

    let action: String = row.try_get("action").map_err(get)?;
    let user_id: Option<uuid::Uuid> = row.try_get("user_id").map_err(get)?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp").map_err(get)?;

    Ok(AuditEntry {
        id: row.try_get("id").map_err(get)?,
        user_id: user_id.map(UserId::from_uuid),
        action: action
            .parse::<AuditAction>()
            .map_err(|e| StoreError::decode(e.to_string()))?,
        table_name: row.try_get("table_name").map_err(get)?,
        record_id: row.try_get("record_id").map_err(get)?,
        old_values: row.try_get("old_values").map_err(get)?,
        new_values: row.try_get("new_values").map_err(get)?,
        timestamp,
        ip_address: row.try_get("ip_address").map_err(get)?,
    })
}

#[async_trait::async_trait]
impl AuditStore for PostgresAuditStore {
    #[instrument(skip(self, entry), fields(action = %entry.action), err)]
    async fn append(&self, entry: UncommittedAuditEntry) -> Result<AuditEntry, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO audit_log (user_id, action, table_name, record_id, old_values, new_values, "timestamp", ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(entry.user_id.map(|u| *u.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.table_name.as_deref())
        .bind(entry.record_id.as_deref())
        .bind(entry.old_values.as_ref())
        .bind(entry.new_values.as_ref())
        .bind(entry.timestamp)
        .bind(&entry.ip_address)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_audit", e))?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("append_audit", e))?;
        Ok(entry.commit(id))
    }

    #[instrument(skip(self), err)]
    async fn query(&self, filter: &AuditFilter, order: SortOrder, page: Pagination) -> Result<AuditPage, StoreError> {
        let actions = filter.action_tags();

        let count_sql = format!("SELECT COUNT(*) AS total FROM audit_log {FILTER_CLAUSE}");
        let count_row = bind_filter(sqlx::query(&count_sql), filter, &actions)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_audit", e))?;
        let total: i64 = count_row.try_get("total").map_err(|e| map_sqlx_error("count_audit", e))?;

        let page_sql = format!("{SELECT_COLUMNS} {FILTER_CLAUSE} {} LIMIT $8 OFFSET $9", order_clause(order));
        let rows = bind_filter(sqlx::query(&page_sql), filter, &actions)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query_audit", e))?;

        let entries = rows.iter().map(entry_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(AuditPage {
            entries,
            total: total.max(0) as u64,
        })
    }
}
