//! Backend selection and wiring.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use stockroom_auth::IdentityProvider;

use crate::config::{Config, IdentityConfig};
use crate::error::{map_sqlx_error, StoreError};
use crate::{
    schema, AuditStore, InMemoryAuditStore, InMemoryIdentityProvider, InMemoryItemStore, InMemoryRoleStore, ItemStore,
    PostgresAuditStore, PostgresItemStore, PostgresRoleStore, RoleStore, SupabaseIdentityProvider,
};

/// The three persistence handles the API shares across requests.
#[derive(Clone)]
pub struct Stores {
    pub roles: Arc<dyn RoleStore>,
    pub audit: Arc<dyn AuditStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            roles: Arc::new(InMemoryRoleStore::new()),
            audit: Arc::new(InMemoryAuditStore::new()),
            items: Arc::new(InMemoryItemStore::new()),
        }
    }

    /// Connect to Postgres and make sure the schema exists.
    pub async fn postgres(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        schema::bootstrap(&pool).await?;

        Ok(Self {
            roles: Arc::new(PostgresRoleStore::new(pool.clone())),
            audit: Arc::new(PostgresAuditStore::new(pool.clone())),
            items: Arc::new(PostgresItemStore::new(pool)),
        })
    }

    /// Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => {
                tracing::info!("using postgres stores");
                Self::postgres(url).await
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
                Ok(Self::in_memory())
            }
        }
    }
}

/// Build the identity provider selected by `config`.
pub fn identity_provider(config: &Config) -> Result<Arc<dyn IdentityProvider>, stockroom_auth::ProviderError> {
    match &config.identity {
        IdentityConfig::Supabase { url, service_role_key } => Ok(Arc::new(SupabaseIdentityProvider::new(
            url.clone(),
            service_role_key.clone(),
            config.identity_timeout,
        )?)),
        IdentityConfig::InMemory => {
            tracing::warn!("IDENTITY_PROVIDER=memory: no users are registered, every token is rejected");
            Ok(Arc::new(InMemoryIdentityProvider::new()))
        }
    }
}
