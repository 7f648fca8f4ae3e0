//! Role assignments: the local mapping from principal to exactly one role.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_auth::Role;
use stockroom_core::UserId;

use crate::StoreError;

pub use in_memory::InMemoryRoleStore;
pub use postgres::PostgresRoleStore;

/// A persisted role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an upsert.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// Role held immediately before the write, if any.
    pub previous_role: Option<Role>,
    /// `false` when the user already held the requested role.
    pub applied: bool,
}

impl RoleChange {
    pub fn is_first_assignment(&self) -> bool {
        self.applied && self.previous_role.is_none()
    }
}

/// Store of role assignments, keyed by user id.
///
/// Implementations must:
/// - return `Ok(None)` only when the lookup succeeded and found nothing
/// - serialize concurrent `assign_role` calls for the same user, so
///   `previous_role` is the value read immediately before the write
/// - never hard-delete rows
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError>;

    /// Insert or update the user's role (a no-op when unchanged).
    async fn assign_role(&self, user_id: UserId, role: Role) -> Result<RoleChange, StoreError>;

    /// Every assignment, ordered by user id.
    async fn list_all(&self) -> Result<Vec<RoleAssignment>, StoreError>;
}

#[async_trait::async_trait]
impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    async fn get_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        (**self).get_role(user_id).await
    }

    async fn assign_role(&self, user_id: UserId, role: Role) -> Result<RoleChange, StoreError> {
        (**self).assign_role(user_id, role).await
    }

    async fn list_all(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        (**self).list_all().await
    }
}
