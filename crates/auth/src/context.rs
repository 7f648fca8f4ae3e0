use stockroom_core::UserId;

use crate::{authorize, Decision, Operation, Principal, Role};

/// Per-request authorization state.
///
/// Built once per inbound call after the credential has been verified and the
/// role lookup attempted, then passed by reference to everything that needs to
/// authorize or audit. It is never shared between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal: Principal,
    resolved_role: Option<Role>,
    client_ip: String,
}

impl RequestContext {
    /// The only constructor: a context cannot exist without a verified principal.
    pub fn new(principal: Principal, resolved_role: Option<Role>, client_ip: impl Into<String>) -> Self {
        Self {
            principal,
            resolved_role,
            client_ip: client_ip.into(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    /// `None` when the principal has no role assignment.
    pub fn role(&self) -> Option<Role> {
        self.resolved_role
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Run the access gate for `operation` against this context's role.
    pub fn authorize(&self, operation: Operation) -> Decision {
        let decision = authorize(self.resolved_role, operation.required_roles());
        match &decision {
            Decision::Allow => {
                tracing::debug!(user_id = %self.principal.id, %operation, "authorized");
            }
            Decision::Deny(reason) => {
                tracing::warn!(
                    user_id = %self.principal.id,
                    role = self.resolved_role.map(|r| r.as_str()).unwrap_or("none"),
                    %operation,
                    "authorization denied: {reason}"
                );
            }
        }
        decision
    }
}
