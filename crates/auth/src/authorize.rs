use serde::Serialize;
use thiserror::Error;

use crate::Role;

/// Why the access gate refused an operation.
///
/// The two variants map to distinct client-visible conditions: a principal
/// without any role is not the same as a principal whose role is too low.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    #[error("no role assigned")]
    NotAssigned,

    #[error("insufficient role: have {have}, need one of {}", join_roles(.need))]
    InsufficientRole { have: Role, need: Vec<Role> },
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert into a `Result` so callers can use `?`.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Decide whether a resolved role may perform an operation requiring `required`.
///
/// - No IO
/// - No panics
/// - `None` means the role lookup succeeded and found no assignment
pub fn authorize(resolved: Option<Role>, required: &[Role]) -> Decision {
    match resolved {
        None => Decision::Deny(DenyReason::NotAssigned),
        Some(role) if required.contains(&role) => Decision::Allow,
        Some(role) => Decision::Deny(DenyReason::InsufficientRole {
            have: role,
            need: required.to_vec(),
        }),
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;
    use proptest::prelude::*;

    fn all_role_sets() -> Vec<Vec<Role>> {
        (0u8..8)
            .map(|mask| {
                Role::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, r)| *r)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn matrix_is_exhaustively_membership() {
        for need in all_role_sets() {
            for have in Role::ALL {
                let decision = authorize(Some(have), &need);
                assert_eq!(decision.is_allowed(), need.contains(&have), "have={have} need={need:?}");
            }
            assert_eq!(authorize(None, &need), Decision::Deny(DenyReason::NotAssigned));
        }
    }

    #[test]
    fn insufficient_role_message_lists_alternatives() {
        let Decision::Deny(reason) = authorize(Some(Role::Viewer), &[Role::Admin, Role::Manager]) else {
            panic!("expected deny");
        };
        assert_eq!(
            reason.to_string(),
            "insufficient role: have viewer, need one of admin, manager"
        );
    }

    #[test]
    fn not_assigned_is_distinct_from_insufficient() {
        let none = authorize(None, Operation::AssignRole.required_roles());
        let low = authorize(Some(Role::Viewer), Operation::AssignRole.required_roles());
        assert_eq!(none, Decision::Deny(DenyReason::NotAssigned));
        assert!(matches!(low, Decision::Deny(DenyReason::InsufficientRole { .. })));
    }

    #[test]
    fn operation_table_drives_decisions() {
        for op in Operation::ALL {
            for role in Role::ALL {
                let expected = op.required_roles().contains(&role);
                assert_eq!(authorize(Some(role), op.required_roles()).is_allowed(), expected);
            }
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Manager), Just(Role::Viewer)]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn allow_iff_member(have in proptest::option::of(role_strategy()), need in proptest::collection::vec(role_strategy(), 0..4)) {
            let decision = authorize(have, &need);
            match have {
                None => prop_assert_eq!(decision, Decision::Deny(DenyReason::NotAssigned)),
                Some(role) => prop_assert_eq!(decision.is_allowed(), need.contains(&role)),
            }
        }
    }
}
