//! Route-side access gate.
//!
//! Handlers call [`require`] first thing, before touching any store, so a
//! denied request never has side effects.

use stockroom_auth::{Operation, RequestContext};

use crate::app::errors::ApiError;

/// Check that the caller's resolved role may perform `operation`.
pub fn require(ctx: &RequestContext, operation: Operation) -> Result<(), ApiError> {
    ctx.authorize(operation).into_result().map_err(ApiError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_auth::{DenyReason, Principal, Role};
    use stockroom_core::UserId;

    fn ctx(role: Option<Role>) -> RequestContext {
        RequestContext::new(Principal::new(UserId::new(), None), role, "127.0.0.1")
    }

    #[test]
    fn denial_keeps_its_reason() {
        assert!(matches!(
            require(&ctx(None), Operation::ListItems),
            Err(ApiError::Forbidden(DenyReason::NotAssigned))
        ));
        assert!(matches!(
            require(&ctx(Some(Role::Viewer)), Operation::DeleteItem),
            Err(ApiError::Forbidden(DenyReason::InsufficientRole { .. }))
        ));
        assert!(require(&ctx(Some(Role::Manager)), Operation::BulkUpdateQuantity).is_ok());
    }
}
