use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed audit action vocabulary.
///
/// Stored as the SCREAMING_SNAKE_CASE tag returned by [`AuditAction::as_str`].
/// New actions may be added; existing tags must never be renamed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateItem,
    UpdateItem,
    UpdateQuantity,
    DeleteItem,
    BulkUpdateQuantity,
    BulkUpdateQuantityFailed,
    LowStockTriggered,
    AssignRole,
    UpdateRole,
    GenerateMonthlyReport,
}

impl AuditAction {
    pub const ALL: [AuditAction; 10] = [
        AuditAction::CreateItem,
        AuditAction::UpdateItem,
        AuditAction::UpdateQuantity,
        AuditAction::DeleteItem,
        AuditAction::BulkUpdateQuantity,
        AuditAction::BulkUpdateQuantityFailed,
        AuditAction::LowStockTriggered,
        AuditAction::AssignRole,
        AuditAction::UpdateRole,
        AuditAction::GenerateMonthlyReport,
    ];

    /// Actions whose `new_values` carry an item quantity.
    pub const QUANTITY_CHANGES: [AuditAction; 4] = [
        AuditAction::CreateItem,
        AuditAction::UpdateItem,
        AuditAction::UpdateQuantity,
        AuditAction::BulkUpdateQuantity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateItem => "CREATE_ITEM",
            AuditAction::UpdateItem => "UPDATE_ITEM",
            AuditAction::UpdateQuantity => "UPDATE_QUANTITY",
            AuditAction::DeleteItem => "DELETE_ITEM",
            AuditAction::BulkUpdateQuantity => "BULK_UPDATE_QUANTITY",
            AuditAction::BulkUpdateQuantityFailed => "BULK_UPDATE_QUANTITY_FAILED",
            AuditAction::LowStockTriggered => "LOW_STOCK_TRIGGERED",
            AuditAction::AssignRole => "ASSIGN_ROLE",
            AuditAction::UpdateRole => "UPDATE_ROLE",
            AuditAction::GenerateMonthlyReport => "GENERATE_MONTHLY_REPORT",
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, AuditAction::BulkUpdateQuantity)
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown audit action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for AuditAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_tags_are_stable() {
        let tags: Vec<&str> = AuditAction::ALL.iter().map(AuditAction::as_str).collect();
        assert_eq!(
            tags,
            vec![
                "CREATE_ITEM",
                "UPDATE_ITEM",
                "UPDATE_QUANTITY",
                "DELETE_ITEM",
                "BULK_UPDATE_QUANTITY",
                "BULK_UPDATE_QUANTITY_FAILED",
                "LOW_STOCK_TRIGGERED",
                "ASSIGN_ROLE",
                "UPDATE_ROLE",
                "GENERATE_MONTHLY_REPORT",
            ]
        );
    }

    #[test]
    fn serde_tag_matches_as_str() {
        for action in AuditAction::ALL {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::Value::String(action.as_str().to_string()));
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("create_item".parse::<AuditAction>().is_err());
    }
}
