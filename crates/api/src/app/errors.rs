//! Error-to-response mapping.
//!
//! Every error body has the shape `{"error": code, "message": msg}`. Server
//! side failures get a generic message; the detail only goes to the log.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use stockroom_auth::{AuthError, DenyReason, ProviderError};
use stockroom_core::DomainError;
use stockroom_infra::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Forbidden(DenyReason),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Request shape problems that are not domain validation (bad query values, unknown enums).
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The body or query string could not be extracted.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            code: "invalid_body",
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            code: "invalid_query",
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }

    fn internal(&self) -> Response {
        tracing::error!("request failed: {self}");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Auth(e) if e.is_client_error() => json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
            ApiError::Auth(_) | ApiError::Store(_) | ApiError::Provider(_) => self.internal(),
            ApiError::Forbidden(reason @ DenyReason::NotAssigned) => {
                json_error(StatusCode::FORBIDDEN, "role_not_assigned", reason.to_string())
            }
            ApiError::Forbidden(reason @ DenyReason::InsufficientRole { .. }) => {
                json_error(StatusCode::FORBIDDEN, "insufficient_role", reason.to_string())
            }
            ApiError::Domain(DomainError::Validation(msg)) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            ApiError::Domain(DomainError::InvalidId(msg)) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg.clone()),
            ApiError::Domain(e @ DomainError::NotFound(_)) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Rejected { status, code, message } => json_error(*status, *code, message.clone()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
