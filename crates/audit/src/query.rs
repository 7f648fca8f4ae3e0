//! Audit query criteria.
//!
//! Listings are paginated by default and newest-first unless a caller asks
//! for ascending order (trend reconstruction does).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, UserId};

use crate::{AuditAction, AuditEntry};

/// Page-based pagination for audit listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 1000;

    /// Validate caller-supplied paging. Zero values are rejected; oversize
    /// limits are capped.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> DomainResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        if page == 0 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if limit == 0 {
            return Err(DomainError::validation("limit must be at least 1"));
        }
        Ok(Self {
            page,
            limit: limit.min(Self::MAX_LIMIT),
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// A single page large enough to hold every entry a store will return.
    pub fn everything() -> Self {
        Self {
            page: 1,
            limit: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// Filter criteria; every field is optional and all present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub user_id: Option<UserId>,
    pub action: Option<AuditAction>,
    /// Match any of these actions (combined with `action` when both are set).
    pub actions: Option<Vec<AuditAction>>,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if self.user_id.is_some() && entry.user_id != self.user_id {
            return false;
        }
        if self.action.is_some_and(|a| a != entry.action) {
            return false;
        }
        if let Some(actions) = &self.actions {
            if !actions.contains(&entry.action) {
                return false;
            }
        }
        if let Some(table) = &self.table_name {
            if entry.table_name.as_deref() != Some(table.as_str()) {
                return false;
            }
        }
        if let Some(record) = &self.record_id {
            if entry.record_id.as_deref() != Some(record.as_str()) {
                return false;
            }
        }
        if self.start.is_some_and(|start| entry.timestamp < start) {
            return false;
        }
        if self.end.is_some_and(|end| entry.timestamp > end) {
            return false;
        }
        true
    }

    /// Tag strings for the `actions` set, as stored.
    pub fn action_tags(&self) -> Option<Vec<String>> {
        self.actions
            .as_ref()
            .map(|actions| actions.iter().map(|a| a.as_str().to_string()).collect())
    }
}

/// Order entries by `(timestamp, id)` in the requested direction.
pub fn sort_entries(entries: &mut [AuditEntry], order: SortOrder) {
    entries.sort_by(|a, b| {
        let asc = a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id));
        match order {
            SortOrder::Ascending => asc,
            SortOrder::Descending => asc.reverse(),
        }
    });
}

/// One page of audit entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    /// Total number of entries matching the filter (across all pages).
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn entry(id: i64, action: AuditAction, at: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            id,
            user_id: None,
            action,
            table_name: Some("items".to_string()),
            record_id: Some("item-1".to_string()),
            old_values: None,
            new_values: None,
            timestamp: at,
            ip_address: "127.0.0.1".to_string(),
        }
    }

    #[test]
    fn pagination_defaults_and_offsets() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 20 });
        assert_eq!(p.offset(), 0);
        assert_eq!(Pagination::new(Some(3), Some(10)).unwrap().offset(), 20);
    }

    #[test]
    fn pagination_rejects_zero_and_caps_limit() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert_eq!(Pagination::new(None, Some(50_000)).unwrap().limit, Pagination::MAX_LIMIT);
    }

    #[test]
    fn filter_combines_fields() {
        let now = Utc::now();
        let e = entry(1, AuditAction::UpdateQuantity, now);

        assert!(AuditFilter::default().matches(&e));
        assert!(AuditFilter {
            actions: Some(vec![AuditAction::CreateItem, AuditAction::UpdateQuantity]),
            record_id: Some("item-1".to_string()),
            ..Default::default()
        }
        .matches(&e));
        assert!(!AuditFilter {
            action: Some(AuditAction::DeleteItem),
            ..Default::default()
        }
        .matches(&e));
        assert!(!AuditFilter {
            user_id: Some(UserId::new()),
            ..Default::default()
        }
        .matches(&e));
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let now = Utc::now();
        let e = entry(1, AuditAction::CreateItem, now);
        let window = AuditFilter {
            start: Some(now),
            end: Some(now),
            ..Default::default()
        };
        assert!(window.matches(&e));

        let later = AuditFilter {
            start: Some(now + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&e));
    }

    #[test]
    fn sorting_breaks_timestamp_ties_by_id() {
        let now = Utc::now();
        let mut entries = vec![
            entry(2, AuditAction::UpdateQuantity, now),
            entry(1, AuditAction::CreateItem, now),
            entry(3, AuditAction::DeleteItem, now - Duration::seconds(5)),
        ];

        sort_entries(&mut entries, SortOrder::Descending);
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        sort_entries(&mut entries, SortOrder::Ascending);
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    proptest! {
        #[test]
        fn accepted_paging_is_clamped(page in 0u32..10_000, limit in 0u32..5_000) {
            match Pagination::new(Some(page), Some(limit)) {
                Ok(p) => {
                    prop_assert!(p.page >= 1);
                    prop_assert!((1..=Pagination::MAX_LIMIT).contains(&p.limit));
                }
                Err(_) => prop_assert!(page == 0 || limit == 0),
            }
        }

        #[test]
        fn consecutive_pages_never_overlap(page in 1u32..10_000, limit in 1u32..=1000) {
            let here = Pagination::new(Some(page), Some(limit)).unwrap();
            let next = Pagination::new(Some(page + 1), Some(limit)).unwrap();
            prop_assert_eq!(here.offset() + u64::from(here.limit), next.offset());
        }
    }
}
