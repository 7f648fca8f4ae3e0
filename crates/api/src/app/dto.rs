//! Request/response DTOs and their mapping to domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_audit::{AuditAction, AuditEntry, AuditFilter, Pagination};
use stockroom_auth::Role;
use stockroom_core::{DomainResult, ItemId, UserId};
use stockroom_inventory::{Item, NewItem};

use crate::app::errors::ApiError;

// ─────────────────────────────────────────────────────────────────────────────
// Items
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl CreateItemRequest {
    pub fn into_new_item(self) -> DomainResult<NewItem> {
        NewItem::new(self.name, self.quantity, self.price, self.category)
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LowStockItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub category: Option<String>,
}

impl From<Item> for LowStockItem {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            category: item.category,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit log
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AuditLogQuery {
    /// Parse the raw query string values; empty values count as absent.
    pub fn into_filter(self) -> Result<(AuditFilter, Pagination), ApiError> {
        let user_id = non_empty(self.user_id)
            .map(|raw| raw.parse::<UserId>())
            .transpose()?;
        let action = non_empty(self.action)
            .map(|raw| raw.parse::<AuditAction>())
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let start = non_empty(self.start_date)
            .map(|raw| parse_instant("start_date", &raw))
            .transpose()?;
        let end = non_empty(self.end_date)
            .map(|raw| parse_instant("end_date", &raw))
            .transpose()?;

        let filter = AuditFilter {
            user_id,
            action,
            table_name: non_empty(self.table_name),
            record_id: non_empty(self.record_id),
            start,
            end,
            ..Default::default()
        };
        let page = Pagination::new(self.page, self.limit)?;
        Ok((filter, page))
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub data: Vec<AuditEntry>,
    pub count: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept an RFC 3339 instant or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_instant(name: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::bad_request(format!("{name} must be an RFC 3339 timestamp or YYYY-MM-DD date")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users and roles
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Option<String>,
}

impl AssignRoleRequest {
    pub fn role(&self) -> Result<Role, ApiError> {
        let raw = self
            .role
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("missing 'role' field in request body"))?;
        raw.parse::<Role>().map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub user_id: UserId,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserWithRole {
    pub user_id: UserId,
    pub role: Role,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_query_parses_and_ignores_blanks() {
        let query = AuditLogQuery {
            user_id: Some(" ".into()),
            action: Some("DELETE_ITEM".into()),
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-03-02T12:00:00+02:00".into()),
            page: Some(2),
            ..Default::default()
        };
        let (filter, page) = query.into_filter().unwrap();
        assert!(filter.user_id.is_none());
        assert_eq!(filter.action, Some(AuditAction::DeleteItem));
        assert_eq!(filter.start.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(filter.end.unwrap().to_rfc3339(), "2024-03-02T10:00:00+00:00");
        assert_eq!((page.page, page.limit), (2, 20));
    }

    #[test]
    fn audit_query_rejects_bad_values() {
        let bad_action = AuditLogQuery {
            action: Some("DROP_TABLE".into()),
            ..Default::default()
        };
        assert!(matches!(bad_action.into_filter(), Err(ApiError::BadRequest(_))));

        let bad_date = AuditLogQuery {
            start_date: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(bad_date.into_filter(), Err(ApiError::BadRequest(_))));

        let zero_page = AuditLogQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_page.into_filter(), Err(ApiError::Domain(_))));
    }

    #[test]
    fn assign_role_body_validation() {
        assert_eq!(
            AssignRoleRequest { role: Some("manager".into()) }.role().unwrap(),
            Role::Manager
        );
        assert!(AssignRoleRequest { role: None }.role().is_err());
        assert!(AssignRoleRequest { role: Some("root".into()) }.role().is_err());
    }
}
