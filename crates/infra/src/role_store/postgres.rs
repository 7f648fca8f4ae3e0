//! Postgres-backed role store.
//!
//! `assign_role` runs in a transaction that first takes a transaction-scoped
//! advisory lock derived from the user id. Concurrent assignments for the same
//! user therefore queue behind each other, and the read of the previous role
//! and the upsert see a consistent row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_auth::Role;
use stockroom_core::UserId;

use super::{RoleAssignment, RoleChange, RoleStore};
use crate::error::{map_sqlx_error, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresRoleStore {
    pool: Arc<PgPool>,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    raw.parse::<Role>().map_err(|e| StoreError::decode(e.to_string()))
}

#[async_trait::async_trait]
impl RoleStore for PostgresRoleStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn get_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT role FROM role_assignments WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_role", e))?;

        match row {
            None => Ok(None),
            Some(row) => {
                let raw: String = row.try_get("role").map_err(|e| map_sqlx_error("get_role", e))?;
                parse_role(&raw).map(Some)
            }
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id, role = %role), err)]
    async fn assign_role(&self, user_id: UserId, role: Role) -> Result<RoleChange, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_role", e))?;

        let previous_role = sqlx::query("SELECT role FROM role_assignments WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("read_role", e))?
            .map(|row| {
                let raw: String = row.try_get("role").map_err(|e| map_sqlx_error("read_role", e))?;
                parse_role(&raw)
            })
            .transpose()?;

        if previous_role == Some(role) {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(RoleChange {
                previous_role,
                applied: false,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO role_assignments (user_id, role, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE
                SET role = EXCLUDED.role,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_role", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(RoleChange {
            previous_role,
            applied: true,
        })
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        let rows = sqlx::query("SELECT user_id, role, updated_at FROM role_assignments ORDER BY user_id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;

        rows.iter()
            .map(|row| {
                let user_id: uuid::Uuid = row.try_get("user_id").map_err(|e| map_sqlx_error("list_roles", e))?;
                let role: String = row.try_get("role").map_err(|e| map_sqlx_error("list_roles", e))?;
                let updated_at: DateTime<Utc> =
                    row.try_get("updated_at").map_err(|e| map_sqlx_error("list_roles", e))?;
                Ok(RoleAssignment {
                    user_id: UserId::from_uuid(user_id),
                    role: parse_role(&role)?,
                    updated_at,
                })
            })
            .collect()
    }
}
