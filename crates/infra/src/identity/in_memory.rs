use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use stockroom_auth::{IdentityProvider, ProviderError, ProviderRejection, ProviderUser};
use stockroom_core::UserId;

/// Process-local identity provider.
///
/// Tokens are registered explicitly and map either to a user or to a
/// rejection. Unknown tokens are rejected as invalid. Counts `verify_token`
/// calls so callers can assert that no round-trip happened.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    users: RwLock<BTreeMap<UserId, ProviderUser>>,
    tokens: RwLock<HashMap<String, Result<UserId, ProviderError>>>,
    verify_calls: AtomicUsize,
}

fn poisoned() -> ProviderError {
    ProviderError::unavailable("identity provider lock poisoned")
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return its id.
    pub fn add_user(&self, email: Option<&str>) -> UserId {
        let id = UserId::new();
        if let Ok(mut users) = self.users.write() {
            users.insert(
                id,
                ProviderUser {
                    id,
                    email: email.map(str::to_string),
                },
            );
        }
        id
    }

    pub fn remove_user(&self, id: UserId) {
        if let Ok(mut users) = self.users.write() {
            users.remove(&id);
        }
    }

    /// Make `token` verify as `user_id`.
    pub fn issue_token(&self, token: impl Into<String>, user_id: UserId) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), Ok(user_id));
        }
    }

    /// Make `token` fail verification with `error`.
    pub fn reject_token(&self, token: impl Into<String>, error: ProviderError) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), Err(error));
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, ProviderError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let outcome = self.tokens.read().map_err(|_| poisoned())?.get(token).cloned();
        let user_id = match outcome {
            Some(Ok(user_id)) => user_id,
            Some(Err(e)) => return Err(e),
            None => {
                return Err(ProviderError::rejected(
                    Some(ProviderRejection::InvalidToken),
                    "invalid JWT: unknown token",
                    Some(401),
                ));
            }
        };

        self.users
            .read()
            .map_err(|_| poisoned())?
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ProviderError::rejected(Some(ProviderRejection::Other), "user not found", Some(403)))
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
        Ok(self.users.read().map_err(|_| poisoned())?.values().cloned().collect())
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<ProviderUser>, ProviderError> {
        Ok(self.users.read().map_err(|_| poisoned())?.get(&id).cloned())
    }
}
