//! Date-range planning for an ETL run.
//!
//! The end of the range is always the resolved last trading day. The start
//! depends on what has already been persisted:
//! - nothing persisted → `end - lookback_days`
//! - persisted through `max` → `max + 1`
//!
//! When the persisted data already reaches `end` there is nothing to do.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Plan the range to fetch, or `None` if the dataset is already current.
///
/// A look-back reaching past the earliest representable date starts there.
pub fn plan_date_range(
    last_trading_day: NaiveDate,
    previous_max: Option<NaiveDate>,
    lookback_days: u32,
) -> Option<DateRange> {
    let start = match previous_max {
        Some(max) => max.succ_opt()?,
        None => last_trading_day
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN),
    };

    (start <= last_trading_day).then_some(DateRange {
        start,
        end: last_trading_day,
    })
}
