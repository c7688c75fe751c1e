//! Shared DTO types used across multiple endpoints.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items.
    pub total: u64,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of pages.
    pub total_pages: u64,
}

/// Which end of a day a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    /// `00:00:00.000`.
    Start,
    /// `23:59:59.999`.
    End,
}

/// Parses a query date as RFC 3339 or as a bare `YYYY-MM-DD`.
///
/// Bare dates are taken in UTC at the given [`DayBound`].
///
/// # Errors
///
/// Returns [`LedgerError::InvalidInput`] naming `field` when neither form
/// parses.
pub fn parse_date_param(
    field: &str,
    raw: &str,
    bound: DayBound,
) -> Result<DateTime<Utc>, LedgerError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        LedgerError::InvalidInput(format!("{field} must be YYYY-MM-DD or RFC 3339"))
    })?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}
