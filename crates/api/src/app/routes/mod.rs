use axum::{routing::get, Router};

pub mod audit;
pub mod items;
pub mod reports;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/items", items::router())
        .merge(reports::router())
        .route("/audit-logs", get(audit::list_audit_logs))
        .nest("/users", users::router())
}
