use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

/// An authenticated identity, independent of its authorization role.
///
/// Created by the identity provider; this system references it but never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}
