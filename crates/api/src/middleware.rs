use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};

use stockroom_auth::{AuthError, IdentityVerifier, RequestContext};
use stockroom_infra::RoleStore;

use crate::app::errors::ApiError;

/// Recorded as the source address when the peer address is unavailable.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

#[derive(Clone)]
pub struct AuthState {
    pub verifier: IdentityVerifier,
    pub roles: Arc<dyn RoleStore>,
}

/// Authenticate the caller and attach a [`RequestContext`] to the request.
///
/// A role lookup that fails is a server error, never "no role": a store
/// outage must not downgrade callers to unassigned.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map(str::to_owned))
        .transpose()
        .map_err(|_| AuthError::malformed("authorization header is not valid text"))?;

    let principal = state.verifier.verify(header.as_deref()).await?;
    let role = state.roles.get_role(principal.id).await?;
    tracing::debug!(
        user_id = %principal.id,
        role = role.map(|r| r.as_str()).unwrap_or("none"),
        "resolved role"
    );

    let client_ip = client_ip(&req);
    req.extensions_mut()
        .insert(RequestContext::new(principal, role, client_ip));

    Ok(next.run(req).await)
}

fn client_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string())
}
