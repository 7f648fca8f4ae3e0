//! HTTP API application wiring (Axum router + shared state).
//!
//! Layout:
//! - `routes/`: HTTP handlers, one file per area
//! - `dto.rs`: request/response DTOs and query parsing
//! - `errors.rs`: error-to-response mapping
//! - `extract.rs`: body and query extractors that reject with `errors.rs` bodies

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};

use stockroom_auth::{IdentityProvider, IdentityVerifier};
use stockroom_infra::{AuditLog, Stores};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;

/// Everything a handler may touch, built once in `main` and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub verifier: IdentityVerifier,
    pub stores: Stores,
    pub audit: AuditLog,
    pub low_stock_threshold: i64,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        stores: Stores,
        identity_timeout: Duration,
        low_stock_threshold: i64,
    ) -> Self {
        Self {
            verifier: IdentityVerifier::new(provider, identity_timeout),
            audit: AuditLog::new(stores.audit.clone()),
            stores,
            low_stock_threshold,
        }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        self.verifier.provider()
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the tests).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        verifier: state.verifier.clone(),
        roles: state.stores.roles.clone(),
    };

    // Everything under /api requires a verified principal.
    let protected = routes::router()
        .layer(Extension(state))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/", get(routes::system::index))
        .route("/health", get(routes::system::health))
        .nest("/api", protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::AUTHORIZATION, Request, StatusCode};
    use stockroom_infra::InMemoryIdentityProvider;
    use tower::ServiceExt;

    fn app(provider: Arc<InMemoryIdentityProvider>) -> Router {
        build_app(AppState::new(
            provider,
            Stores::in_memory(),
            Duration::from_secs(1),
            stockroom_inventory::LOW_STOCK_THRESHOLD,
        ))
    }

    #[tokio::test]
    async fn public_routes_skip_auth() {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let res = app(provider.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(provider.verify_calls(), 0);
    }

    #[tokio::test]
    async fn api_routes_require_bearer() {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let res = app(provider.clone())
            .oneshot(
                Request::get("/api/items")
                    .header(AUTHORIZATION, "Basic xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(provider.verify_calls(), 0);
    }
}
