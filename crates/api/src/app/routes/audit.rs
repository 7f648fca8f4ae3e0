use axum::{
    extract::Extension,
    Json,
};

use stockroom_audit::SortOrder;
use stockroom_auth::{Operation, RequestContext};

use crate::app::dto::{AuditLogPage, AuditLogQuery};
use crate::app::errors::ApiError;
use crate::app::extract::ApiQuery;
use crate::app::AppState;
use crate::authz;

/// GET /api/audit-logs
///
/// Newest first; `count` is the number of matching entries across all pages.
pub async fn list_audit_logs(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> Result<Json<AuditLogPage>, ApiError> {
    authz::require(&ctx, Operation::ViewAuditLog)?;

    let (filter, page) = query.into_filter()?;
    let result = state.stores.audit.query(&filter, SortOrder::Descending, page).await?;

    Ok(Json(AuditLogPage {
        data: result.entries,
        count: result.total,
    }))
}
