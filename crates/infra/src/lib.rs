//! Infrastructure layer: configuration, persistence, identity provider
//! clients and the audit recorder.

pub mod audit_log;
pub mod audit_store;
pub mod config;
pub mod error;
pub mod identity;
pub mod item_store;
pub mod role_store;
pub mod schema;
pub mod stores;
pub mod trend;

pub use audit_log::AuditLog;
pub use audit_store::{AuditStore, InMemoryAuditStore, PostgresAuditStore};
pub use config::{Config, ConfigError, IdentityConfig};
pub use error::StoreError;
pub use identity::{InMemoryIdentityProvider, SupabaseIdentityProvider};
pub use item_store::{InMemoryItemStore, ItemStore, PostgresItemStore};
pub use role_store::{InMemoryRoleStore, PostgresRoleStore, RoleAssignment, RoleChange, RoleStore};
pub use stores::{identity_provider, Stores};
pub use trend::{item_trend, ITEMS_TABLE};
