use axum::{extract::Extension, http::StatusCode, Json};
use serde_json::{json, Value};

use stockroom_auth::{Operation, RequestContext};

use crate::app::dto::WhoAmIResponse;
use crate::app::errors::ApiError;
use crate::authz;

pub async fn index() -> Json<Value> {
    Json(json!({ "message": "Stockroom inventory API is running" }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> Result<Json<WhoAmIResponse>, ApiError> {
    authz::require(&ctx, Operation::WhoAmI)?;

    Ok(Json(WhoAmIResponse {
        user_id: ctx.user_id(),
        email: ctx.principal().email.clone(),
        role: ctx.role(),
    }))
}
