use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use stockroom_auth::Role;
use stockroom_core::UserId;

use super::{RoleAssignment, RoleChange, RoleStore};
use crate::StoreError;

/// In-memory role store.
///
/// Intended for tests/dev. `assign_role` runs its read-compare-write under a
/// single write lock.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: RwLock<BTreeMap<UserId, (Role, DateTime<Utc>)>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("role store lock poisoned")
}

#[async_trait::async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn get_role(&self, user_id: UserId) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles.get(&user_id).map(|(role, _)| *role))
    }

    async fn assign_role(&self, user_id: UserId, role: Role) -> Result<RoleChange, StoreError> {
        let mut roles = self.roles.write().map_err(|_| poisoned())?;
        let previous_role = roles.get(&user_id).map(|(r, _)| *r);

        if previous_role == Some(role) {
            return Ok(RoleChange {
                previous_role,
                applied: false,
            });
        }

        roles.insert(user_id, (role, Utc::now()));
        Ok(RoleChange {
            previous_role,
            applied: true,
        })
    }

    async fn list_all(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        let roles = self.roles.read().map_err(|_| poisoned())?;
        Ok(roles
            .iter()
            .map(|(user_id, (role, updated_at))| RoleAssignment {
                user_id: *user_id,
                role: *role,
                updated_at: *updated_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn unknown_user_has_no_role() {
        let store = InMemoryRoleStore::new();
        assert_eq!(store.get_role(UserId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn assign_insert_noop_update() {
        let store = InMemoryRoleStore::new();
        let user = UserId::new();

        let first = store.assign_role(user, Role::Viewer).await.unwrap();
        assert_eq!(first, RoleChange { previous_role: None, applied: true });
        assert!(first.is_first_assignment());

        let same = store.assign_role(user, Role::Viewer).await.unwrap();
        assert_eq!(same, RoleChange { previous_role: Some(Role::Viewer), applied: false });

        let changed = store.assign_role(user, Role::Manager).await.unwrap();
        assert_eq!(changed, RoleChange { previous_role: Some(Role::Viewer), applied: true });
        assert_eq!(store.get_role(user).await.unwrap(), Some(Role::Manager));
    }

    #[tokio::test]
    async fn list_is_ordered_by_user_id() {
        let store = InMemoryRoleStore::new();
        let mut users: Vec<UserId> = (0..5).map(|_| UserId::new()).collect();
        for (i, user) in users.iter().enumerate().rev() {
            let role = Role::ALL[i % Role::ALL.len()];
            store.assign_role(*user, role).await.unwrap();
        }

        users.sort();
        let listed: Vec<UserId> = store.list_all().await.unwrap().into_iter().map(|a| a.user_id).collect();
        assert_eq!(listed, users);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_assignments_observe_each_other() {
        let store = Arc::new(InMemoryRoleStore::new());
        let user = UserId::new();

        let tasks: Vec<_> = [Role::Admin, Role::Manager]
            .into_iter()
            .map(|role| {
                let store = store.clone();
                tokio::spawn(async move { store.assign_role(user, role).await.unwrap() })
            })
            .collect();

        let mut changes = Vec::new();
        for t in tasks {
            changes.push(t.await.unwrap());
        }

        // Exactly one writer saw the empty slot; the other saw its value.
        assert_eq!(changes.iter().filter(|c| c.previous_role.is_none()).count(), 1);
        assert!(changes.iter().all(|c| c.applied));
    }
}
