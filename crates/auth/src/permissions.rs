use serde::Serialize;

use crate::Role;

/// Every operation guarded by the access gate.
///
/// The required-role set of each operation is declared statically in
/// [`Operation::required_roles`], so the whole matrix can be tested without a
/// live store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateItem,
    ListItems,
    GetItem,
    UpdateItem,
    UpdateQuantity,
    DeleteItem,
    BulkUpdateQuantity,
    ViewTrends,
    ViewLowStock,
    GenerateMonthlyReport,
    ViewAuditLog,
    ListUsers,
    GetUserRole,
    AssignRole,
    WhoAmI,
}

const ADMIN: &[Role] = &[Role::Admin];
const MANAGER: &[Role] = &[Role::Manager];
const ADMIN_MANAGER: &[Role] = &[Role::Admin, Role::Manager];
const ANY_ROLE: &[Role] = &[Role::Admin, Role::Manager, Role::Viewer];

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::CreateItem,
        Operation::ListItems,
        Operation::GetItem,
        Operation::UpdateItem,
        Operation::UpdateQuantity,
        Operation::DeleteItem,
        Operation::BulkUpdateQuantity,
        Operation::ViewTrends,
        Operation::ViewLowStock,
        Operation::GenerateMonthlyReport,
        Operation::ViewAuditLog,
        Operation::ListUsers,
        Operation::GetUserRole,
        Operation::AssignRole,
        Operation::WhoAmI,
    ];

    /// Roles allowed to perform this operation.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Operation::CreateItem
            | Operation::DeleteItem
            | Operation::GenerateMonthlyReport
            | Operation::ViewAuditLog
            | Operation::ListUsers
            | Operation::AssignRole => ADMIN,

            Operation::UpdateItem | Operation::UpdateQuantity | Operation::ViewLowStock => {
                ADMIN_MANAGER
            }

            // Bulk uploads are a manager workflow; admins go through single-item edits.
            Operation::BulkUpdateQuantity => MANAGER,

            Operation::ListItems
            | Operation::GetItem
            | Operation::ViewTrends
            | Operation::GetUserRole
            | Operation::WhoAmI => ANY_ROLE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateItem => "create_item",
            Operation::ListItems => "list_items",
            Operation::GetItem => "get_item",
            Operation::UpdateItem => "update_item",
            Operation::UpdateQuantity => "update_quantity",
            Operation::DeleteItem => "delete_item",
            Operation::BulkUpdateQuantity => "bulk_update_quantity",
            Operation::ViewTrends => "view_trends",
            Operation::ViewLowStock => "view_low_stock",
            Operation::GenerateMonthlyReport => "generate_monthly_report",
            Operation::ViewAuditLog => "view_audit_log",
            Operation::ListUsers => "list_users",
            Operation::GetUserRole => "get_user_role",
            Operation::AssignRole => "assign_role",
            Operation::WhoAmI => "whoami",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_allows_at_least_one_role() {
        for op in Operation::ALL {
            assert!(!op.required_roles().is_empty(), "{op} has no roles");
        }
    }

    #[test]
    fn admin_only_operations() {
        for op in [
            Operation::CreateItem,
            Operation::DeleteItem,
            Operation::GenerateMonthlyReport,
            Operation::ViewAuditLog,
            Operation::ListUsers,
            Operation::AssignRole,
        ] {
            assert_eq!(op.required_roles(), &[Role::Admin], "{op}");
        }
    }

    #[test]
    fn bulk_update_is_manager_only() {
        assert_eq!(Operation::BulkUpdateQuantity.required_roles(), &[Role::Manager]);
    }

    #[test]
    fn read_operations_open_to_viewers() {
        for op in [
            Operation::ListItems,
            Operation::GetItem,
            Operation::ViewTrends,
            Operation::GetUserRole,
            Operation::WhoAmI,
        ] {
            assert!(op.required_roles().contains(&Role::Viewer), "{op}");
        }
        assert!(!Operation::ViewLowStock.required_roles().contains(&Role::Viewer));
    }
}
