//! User directory and role assignment endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use stockroom_audit::{AuditAction, AuditContext, AuditEntryDraft};
use stockroom_auth::{Operation, RequestContext};
use stockroom_core::UserId;

use crate::app::dto::{AssignRoleRequest, UserRoleResponse, UserWithRole};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::AppState;
use crate::authz;

const ROLES_TABLE: &str = "role_assignments";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/role", get(get_user_role).put(assign_role))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(raw.parse::<UserId>()?)
}

/// GET /api/users
///
/// Every role assignment joined with the provider's directory. Assignments
/// whose user the provider no longer knows are kept, with a null email.
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<UserWithRole>>, ApiError> {
    authz::require(&ctx, Operation::ListUsers)?;

    let assignments = state.stores.roles.list_all().await?;
    if assignments.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let emails: HashMap<UserId, Option<String>> = state
        .provider()
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u.email))
        .collect();

    let users = assignments
        .into_iter()
        .map(|a| {
            let email = match emails.get(&a.user_id) {
                Some(email) => email.clone(),
                None => {
                    tracing::warn!(user_id = %a.user_id, "role assigned to a user unknown to the identity provider");
                    None
                }
            };
            UserWithRole {
                user_id: a.user_id,
                role: a.role,
                email,
            }
        })
        .collect();

    Ok(Json(users))
}

/// GET /api/users/:id/role
pub async fn get_user_role(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<UserRoleResponse>, ApiError> {
    authz::require(&ctx, Operation::GetUserRole)?;

    let user_id = parse_user_id(&id)?;
    let role = state
        .stores
        .roles
        .get_role(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user role"))?;

    Ok(Json(UserRoleResponse { user_id, role }))
}

/// PUT /api/users/:id/role
///
/// The target must exist in the identity provider. Re-assigning the role a
/// user already holds is a no-op and writes no audit entry.
pub async fn assign_role(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AssignRoleRequest>,
) -> Result<Response, ApiError> {
    authz::require(&ctx, Operation::AssignRole)?;

    let user_id = parse_user_id(&id)?;
    let role = body.role()?;

    if state.provider().get_user_by_id(user_id).await?.is_none() {
        tracing::warn!(%user_id, "role assignment for a user unknown to the identity provider");
        return Err(ApiError::not_found("user"));
    }

    let change = state.stores.roles.assign_role(user_id, role).await?;
    if !change.applied {
        return Ok(Json(json!({ "message": "User already has this role." })).into_response());
    }

    let action = if change.is_first_assignment() {
        AuditAction::AssignRole
    } else {
        AuditAction::UpdateRole
    };
    tracing::info!(
        %user_id,
        %role,
        previous = change.previous_role.map(|r| r.as_str()).unwrap_or("none"),
        by = %ctx.user_id(),
        "role assigned"
    );

    let mut draft = AuditEntryDraft::new(action)
        .table(ROLES_TABLE)
        .record(user_id)
        .new_values(json!({ "role": role }));
    if let Some(previous) = change.previous_role {
        draft = draft.old_values(json!({ "role": previous }));
    }
    state.audit.record(&AuditContext::from(&ctx), draft).await;

    Ok(Json(UserRoleResponse { user_id, role }).into_response())
}
