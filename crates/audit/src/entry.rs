use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_auth::RequestContext;
use stockroom_core::UserId;

use crate::AuditAction;

/// Who performed an audited action and where the request came from.
///
/// `user_id` is `None` only for system-initiated work; the recorder logs a
/// warning when an entry is written without an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub user_id: Option<UserId>,
    pub ip_address: String,
}

impl AuditContext {
    pub fn system(ip_address: impl Into<String>) -> Self {
        Self {
            user_id: None,
            ip_address: ip_address.into(),
        }
    }
}

impl From<&RequestContext> for AuditContext {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            user_id: Some(ctx.user_id()),
            ip_address: ctx.client_ip().to_string(),
        }
    }
}

/// What a handler wants recorded, before actor and time are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntryDraft {
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl AuditEntryDraft {
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            table_name: None,
            record_id: None,
            old_values: None,
            new_values: None,
        }
    }

    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn record(mut self, record_id: impl ToString) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }

    pub fn old_values(mut self, values: Value) -> Self {
        self.old_values = snapshot(values);
        self
    }

    pub fn new_values(mut self, values: Value) -> Self {
        self.new_values = snapshot(values);
        self
    }

    /// Attach actor and time; the store assigns the id on append.
    pub fn stamp(self, ctx: &AuditContext, timestamp: DateTime<Utc>) -> UncommittedAuditEntry {
        UncommittedAuditEntry {
            user_id: ctx.user_id,
            action: self.action,
            table_name: self.table_name,
            record_id: self.record_id,
            old_values: self.old_values,
            new_values: self.new_values,
            timestamp,
            ip_address: ctx.ip_address.clone(),
        }
    }
}

// Empty snapshots are stored as absent.
fn snapshot(values: Value) -> Option<Value> {
    match &values {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        _ => Some(values),
    }
}

/// An entry ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct UncommittedAuditEntry {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
}

impl UncommittedAuditEntry {
    pub fn commit(self, id: i64) -> AuditEntry {
        AuditEntry {
            id,
            user_id: self.user_id,
            action: self.action,
            table_name: self.table_name,
            record_id: self.record_id,
            old_values: self.old_values,
            new_values: self.new_values,
            timestamp: self.timestamp,
            ip_address: self.ip_address,
        }
    }
}

/// A persisted audit entry.
///
/// `id` is assigned by the store in append order and breaks timestamp ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_auth::{Principal, Role};

    #[test]
    fn empty_snapshots_are_dropped() {
        let draft = AuditEntryDraft::new(AuditAction::DeleteItem)
            .old_values(json!({}))
            .new_values(Value::Null);
        assert!(draft.old_values.is_none());
        assert!(draft.new_values.is_none());
    }

    #[test]
    fn stamp_carries_actor_from_request_context() {
        let user = UserId::new();
        let ctx = RequestContext::new(Principal::new(user, None), Some(Role::Admin), "10.0.0.7");
        let at = Utc::now();

        let entry = AuditEntryDraft::new(AuditAction::CreateItem)
            .table("items")
            .record("abc")
            .new_values(json!({"quantity": 3}))
            .stamp(&AuditContext::from(&ctx), at)
            .commit(42);

        assert_eq!(entry.id, 42);
        assert_eq!(entry.user_id, Some(user));
        assert_eq!(entry.ip_address, "10.0.0.7");
        assert_eq!(entry.table_name.as_deref(), Some("items"));
        assert_eq!(entry.record_id.as_deref(), Some("abc"));
        assert_eq!(entry.timestamp, at);
    }

    #[test]
    fn system_context_has_no_actor() {
        let entry = AuditEntryDraft::new(AuditAction::GenerateMonthlyReport).stamp(&AuditContext::system("0.0.0.0"), Utc::now());
        assert!(entry.user_id.is_none());
    }
}
