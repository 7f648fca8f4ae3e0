use axum::{
    extract::Extension,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use stockroom_audit::{AuditAction, AuditContext, AuditEntryDraft};
use stockroom_auth::{Operation, RequestContext};
use stockroom_inventory::{monthly_report, MonthlyReport, ReportMonth};

use crate::app::dto::{LowStockItem, LowStockQuery, ReportQuery};
use crate::app::errors::ApiError;
use crate::app::extract::ApiQuery;
use crate::app::AppState;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/alerts/low-stock", get(low_stock_alerts))
        .route("/reports/inventory/monthly", get(monthly_inventory_report))
}

/// GET /api/alerts/low-stock?threshold=
pub async fn low_stock_alerts(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> Result<Json<Vec<LowStockItem>>, ApiError> {
    authz::require(&ctx, Operation::ViewLowStock)?;

    let threshold = query.threshold.unwrap_or(state.low_stock_threshold);
    let items = state.stores.items.below_threshold(threshold).await?;
    tracing::debug!(threshold, count = items.len(), "low-stock lookup");
    Ok(Json(items.into_iter().map(LowStockItem::from).collect()))
}

/// GET /api/reports/inventory/monthly?year=&month=
///
/// The month only labels the report; figures come from current stock.
pub async fn monthly_inventory_report(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<MonthlyReport>, ApiError> {
    authz::require(&ctx, Operation::GenerateMonthlyReport)?;

    let now = Utc::now();
    let month = ReportMonth::resolve(query.year, query.month, now)?;
    let items = state.stores.items.list().await?;
    let report = monthly_report(month, items, now);

    state
        .audit
        .record(
            &AuditContext::from(&ctx),
            AuditEntryDraft::new(AuditAction::GenerateMonthlyReport).new_values(json!({ "month": month.to_string() })),
        )
        .await;

    Ok(Json(report))
}
