//! Inputs and outputs of the ledger store operations.

use chrono::{DateTime, Utc};

use crate::domain::{CustomerSnapshot, Movement, MovementKind, Redemption, RewardItem};
use crate::error::LedgerError;

/// Default page size for movement history.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size accepted for movement history.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated credit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditEntry {
    /// Customer to credit.
    pub customer_id: i64,
    /// Points to add, always positive.
    pub points: i64,
    /// Source label, non-empty.
    pub origin: String,
    /// Originating store.
    pub store_id: Option<i64>,
    /// Free-text note.
    pub note: Option<String>,
    /// Acting user.
    pub created_by: i64,
}

/// A validated redemption debit. `cost` comes from the reward catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionDebit {
    /// Customer to debit.
    pub customer_id: i64,
    /// Item being redeemed.
    pub reward_item_id: i64,
    /// Points to remove, always positive.
    pub cost: i64,
    /// Free-text note.
    pub note: Option<String>,
    /// Acting user.
    pub created_by: i64,
}

/// Committed credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditOutcome {
    /// The appended movement.
    pub movement: Movement,
    /// Customer as of the commit.
    pub customer: CustomerSnapshot,
}

/// Committed redemption debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionOutcome {
    /// The appended debit movement.
    pub movement: Movement,
    /// The issued code row.
    pub redemption: Redemption,
    /// Customer as of the commit.
    pub customer: CustomerSnapshot,
}

/// Sort direction for movement history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses `asc` / `desc` case-insensitively; anything else is `Desc`.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters and paging for a customer's movement history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementFilter {
    /// Only this kind.
    pub kind: Option<MovementKind>,
    /// Only this origin (exact match).
    pub origin: Option<String>,
    /// Created at or after.
    pub from: Option<DateTime<Utc>>,
    /// Created at or before.
    pub to: Option<DateTime<Utc>>,
    /// Sort direction by creation time.
    pub order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for MovementFilter {
    fn default() -> Self {
        Self {
            kind: None,
            origin: None,
            from: None,
            to: None,
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl MovementFilter {
    /// Checks paging bounds and the date range.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] if `page` is zero, `limit` is
    /// outside `1..=MAX_PAGE_LIMIT`, or `from` is after `to`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.page == 0 {
            return Err(LedgerError::InvalidInput("page must be >= 1".to_string()));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(LedgerError::InvalidInput(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(LedgerError::InvalidInput(
                "dt_ini must not be after dt_fim".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether a movement passes the kind, origin and date filters.
    #[must_use]
    pub fn matches(&self, movement: &Movement) -> bool {
        self.kind.is_none_or(|k| k == movement.kind)
            && self.origin.as_deref().is_none_or(|o| o == movement.origin)
            && self.from.is_none_or(|from| movement.created_at >= from)
            && self.to.is_none_or(|to| movement.created_at <= to)
    }
}

/// One page of movement history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPage {
    /// Movements on this page.
    pub movements: Vec<Movement>,
    /// Total matching rows across all pages.
    pub total: u64,
}

impl MovementPage {
    /// Number of pages for `limit` rows per page.
    #[must_use]
    pub fn total_pages(&self, limit: u32) -> u64 {
        if limit == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(limit))
        }
    }
}

/// Reward item with the customer's newest pending code for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardWithPending {
    /// Catalog entry.
    pub item: RewardItem,
    /// Newest unused code this customer holds for the item.
    pub pending_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_filter_is_valid() {
        let filter = MovementFilter::default();
        assert!(filter.validate().is_ok());
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn paging_bounds_are_enforced() {
        let zero_page = MovementFilter {
            page: 0,
            ..MovementFilter::default()
        };
        assert!(zero_page.validate().is_err());

        let huge = MovementFilter {
            limit: MAX_PAGE_LIMIT + 1,
            ..MovementFilter::default()
        };
        assert!(huge.validate().is_err());

        let third = MovementFilter {
            page: 3,
            limit: 20,
            ..MovementFilter::default()
        };
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let filter = MovementFilter {
            from: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).single(),
            to: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single(),
            ..MovementFilter::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn sort_order_parses_leniently() {
        assert_eq!(SortOrder::parse_lenient(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(None), SortOrder::Desc);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = MovementPage {
            movements: Vec::new(),
            total: 21,
        };
        assert_eq!(page.total_pages(10), 3);
        assert_eq!(page.total_pages(0), 0);
    }
}
