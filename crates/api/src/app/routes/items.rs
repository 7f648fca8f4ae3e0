//! Inventory item endpoints.
//!
//! Every mutation is followed by an audit entry on the `items` table keyed by
//! the item id. Audit failures never change the response.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use stockroom_audit::{AuditAction, AuditContext, AuditEntryDraft, Trend};
use stockroom_auth::{Operation, RequestContext};
use stockroom_core::ItemId;
use stockroom_inventory::{validate_quantity, BulkRow, BulkSummary, Item, ItemPatch, QuantityChange};
use stockroom_infra::{item_trend, ITEMS_TABLE};

use crate::app::dto::{CreateItemRequest, QuantityRequest};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::AppState;
use crate::authz;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/bulk-update-quantity", post(bulk_update_quantity))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/quantity", patch(update_quantity))
        .route("/:id/trends", get(item_trends))
}

fn parse_item_id(raw: &str) -> Result<ItemId, ApiError> {
    Ok(raw.parse::<ItemId>()?)
}

fn snapshot(item: &Item) -> Value {
    serde_json::to_value(item).unwrap_or_else(|e| {
        tracing::warn!(item_id = %item.id, "audit snapshot dropped: {e}");
        Value::Null
    })
}

fn item_draft(action: AuditAction, id: ItemId) -> AuditEntryDraft {
    AuditEntryDraft::new(action).table(ITEMS_TABLE).record(id)
}

/// Audit one applied quantity change, plus the low-stock event when it crosses `threshold`.
async fn record_quantity_change(state: &AppState, actor: &AuditContext, change: &QuantityChange) {
    state
        .audit
        .record(
            actor,
            item_draft(AuditAction::UpdateQuantity, change.item_id)
                .old_values(json!({ "quantity": change.old_quantity }))
                .new_values(json!({ "quantity": change.new_quantity })),
        )
        .await;

    if change.crosses_low_stock(state.low_stock_threshold) {
        tracing::info!(
            item_id = %change.item_id,
            quantity = change.new_quantity,
            threshold = state.low_stock_threshold,
            "item dropped below low-stock threshold"
        );
        state
            .audit
            .record(
                actor,
                item_draft(AuditAction::LowStockTriggered, change.item_id).new_values(json!({
                    "quantity": change.new_quantity,
                    "threshold": state.low_stock_threshold,
                })),
            )
            .await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/items
pub async fn create_item(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&ctx, Operation::CreateItem)?;

    let new_item = body.into_new_item()?;
    let item = state
        .stores
        .items
        .insert(Item::create(ItemId::new(), new_item, Utc::now()))
        .await?;
    tracing::info!(item_id = %item.id, user_id = %ctx.user_id(), "item created");

    state
        .audit
        .record(
            &AuditContext::from(&ctx),
            item_draft(AuditAction::CreateItem, item.id).new_values(snapshot(&item)),
        )
        .await;

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/items
pub async fn list_items(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<Item>>, ApiError> {
    authz::require(&ctx, Operation::ListItems)?;
    Ok(Json(state.stores.items.list().await?))
}

/// GET /api/items/:id
pub async fn get_item(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    authz::require(&ctx, Operation::GetItem)?;

    let id = parse_item_id(&id)?;
    let item = state
        .stores
        .items
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    Ok(Json(item))
}

/// PUT /api/items/:id
pub async fn update_item(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ItemPatch>,
) -> Result<Json<Item>, ApiError> {
    authz::require(&ctx, Operation::UpdateItem)?;

    let id = parse_item_id(&id)?;
    let patch = body.validate()?;
    let before = state
        .stores
        .items
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    let after = state
        .stores
        .items
        .update(id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    tracing::info!(item_id = %id, user_id = %ctx.user_id(), "item updated");

    state
        .audit
        .record(
            &AuditContext::from(&ctx),
            item_draft(AuditAction::UpdateItem, id)
                .old_values(snapshot(&before))
                .new_values(snapshot(&after)),
        )
        .await;

    Ok(Json(after))
}

/// PATCH /api/items/:id/quantity
pub async fn update_quantity(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<QuantityRequest>,
) -> Result<Json<Item>, ApiError> {
    authz::require(&ctx, Operation::UpdateQuantity)?;

    let id = parse_item_id(&id)?;
    let quantity = validate_quantity(body.quantity)?;
    let change = state
        .stores
        .items
        .set_quantity(id, quantity)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    tracing::info!(
        item_id = %id,
        old = change.old_quantity,
        new = change.new_quantity,
        "quantity updated"
    );

    record_quantity_change(&state, &AuditContext::from(&ctx), &change).await;

    let item = state
        .stores
        .items
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    Ok(Json(item))
}

/// DELETE /api/items/:id
pub async fn delete_item(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authz::require(&ctx, Operation::DeleteItem)?;

    let id = parse_item_id(&id)?;
    let removed = state
        .stores
        .items
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    tracing::info!(item_id = %id, user_id = %ctx.user_id(), "item deleted");

    state
        .audit
        .record(
            &AuditContext::from(&ctx),
            item_draft(AuditAction::DeleteItem, id).old_values(snapshot(&removed)),
        )
        .await;

    Ok(Json(json!({ "message": "Item deleted successfully" })))
}

/// POST /api/items/bulk-update-quantity
///
/// Rows are applied one by one; a bad row is reported in the summary and does
/// not stop the batch. A store failure aborts the remaining rows.
pub async fn bulk_update_quantity(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(rows): ApiJson<Vec<BulkRow>>,
) -> Result<Json<BulkSummary>, ApiError> {
    authz::require(&ctx, Operation::BulkUpdateQuantity)?;

    if rows.is_empty() {
        return Err(ApiError::bad_request("no rows provided"));
    }

    let actor = AuditContext::from(&ctx);
    let mut summary = BulkSummary::default();
    let mut applied: Vec<QuantityChange> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let (item_id, quantity) = match row.validate() {
            Ok(parsed) => parsed,
            Err(e) => {
                summary.record_failure(row_number, format!("Invalid data - {e}"));
                continue;
            }
        };

        match state.stores.items.set_quantity(item_id, quantity).await {
            Ok(Some(change)) => {
                summary.record_success();
                record_quantity_change(&state, &actor, &change).await;
                applied.push(change);
            }
            Ok(None) => summary.record_failure(row_number, format!("Item ID '{item_id}' not found.")),
            Err(e) => {
                tracing::error!(row = row_number, %item_id, "bulk update aborted: {e}");
                state
                    .audit
                    .record(
                        &actor,
                        AuditEntryDraft::new(AuditAction::BulkUpdateQuantityFailed)
                            .table(ITEMS_TABLE)
                            .new_values(json!({
                                "error": e.to_string(),
                                "summary": summary,
                                "updated_items": applied,
                            })),
                    )
                    .await;
                return Err(e.into());
            }
        }
    }

    tracing::info!(
        success = summary.success,
        failed = summary.failed,
        user_id = %ctx.user_id(),
        "bulk quantity update finished"
    );
    state
        .audit
        .record(
            &actor,
            AuditEntryDraft::new(AuditAction::BulkUpdateQuantity)
                .table(ITEMS_TABLE)
                .new_values(json!({
                    "summary": summary,
                    "updated_items": applied,
                })),
        )
        .await;

    Ok(Json(summary))
}

/// GET /api/items/:id/trends
pub async fn item_trends(
    Extension(state): Extension<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Trend>, ApiError> {
    authz::require(&ctx, Operation::ViewTrends)?;

    let id = parse_item_id(&id)?;
    let trend = item_trend(&*state.stores.audit, &*state.stores.items, id).await?;
    Ok(Json(trend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_inventory::NewItem;

    #[test]
    fn snapshot_carries_every_item_field() {
        let item = Item::create(
            ItemId::new(),
            NewItem::new("bolt", 4, 0.25, Some("hardware".to_string())).unwrap(),
            Utc::now(),
        );
        let value = snapshot(&item);
        assert_eq!(value["id"], json!(item.id.to_string()));
        assert_eq!(value["quantity"], json!(4));
        assert_eq!(value["category"], json!("hardware"));
    }
}
