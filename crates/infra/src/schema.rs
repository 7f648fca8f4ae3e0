//! Schema bootstrap for the Postgres backend.

use sqlx::PgPool;
use tracing::instrument;

use crate::error::{map_sqlx_error, StoreError};

/// DDL for every table the Postgres stores use (`CREATE ... IF NOT EXISTS`).
pub const SCHEMA_SQL: &str = include_str!("../migrations/schema.sql");

/// Create missing tables and indexes.
#[instrument(skip(pool), err)]
pub async fn bootstrap(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("bootstrap_schema", e))?;
    tracing::info!("database schema ready");
    Ok(())
}
