//! Last-trading-day resolution.
//!
//! Given a reference instant:
//! 1. Move it onto the exchange clock (UTC+05:30).
//! 2. At or after the cutoff (18:30 local) the day's bhavcopy is presumed
//!    published, so the search starts today; before it, yesterday.
//! 3. Fetch the holiday and special-session sets.
//! 4. Walk backward one day at a time until the trading-day predicate holds,
//!    giving up after `horizon` candidates.

use super::session::{default_cutoff, ReferenceInstant};
use super::trading_day::{ExceptionSets, ExceptionSource};
use crate::data::provider::DataError;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::{debug, info};

/// Default number of candidate days examined before giving up.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Failures of a resolution. None of these is ever mapped to a default date.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid reference instant: {0}")]
    InvalidInput(String),

    #[error("exception lists unavailable: {0}")]
    DataUnavailable(#[from] DataError),

    #[error("no trading day found in {horizon} days back from {start}; exception data looks empty or corrupt")]
    NoTradingDayFound { start: NaiveDate, horizon: u32 },
}

/// Resolver with an explicit cutoff time and search horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastTradingDayResolver {
    cutoff: NaiveTime,
    horizon: u32,
}

impl Default for LastTradingDayResolver {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            horizon: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl LastTradingDayResolver {
    pub fn new(cutoff: NaiveTime, horizon: u32) -> Self {
        Self { cutoff, horizon }
    }

    pub fn with_cutoff(mut self, cutoff: NaiveTime) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn cutoff(&self) -> NaiveTime {
        self.cutoff
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    /// First candidate date of the backward search.
    ///
    /// Exactly at the cutoff counts as after it.
    pub fn search_start(
        &self,
        reference: impl Into<ReferenceInstant>,
    ) -> Result<NaiveDate, CalendarError> {
        let local = reference.into().to_exchange_time()?;
        let today = local.date_naive();

        if local.time() >= self.cutoff {
            Ok(today)
        } else {
            today.pred_opt().ok_or_else(|| {
                CalendarError::InvalidInput(format!("no calendar day before {today}"))
            })
        }
    }

    /// Resolve against exception sets fetched from `source`.
    ///
    /// The reference is validated before any fetch is attempted.
    pub fn resolve<S: ExceptionSource + ?Sized>(
        &self,
        reference: impl Into<ReferenceInstant>,
        source: &S,
    ) -> Result<NaiveDate, CalendarError> {
        let reference = reference.into();
        let local_today = reference.to_exchange_time()?.date_naive();
        let start = self.search_start(reference)?;

        let sets = source.exception_sets(local_today)?;
        debug!(
            holidays = sets.holidays().len(),
            special_sessions = sets.special_sessions().len(),
            "exception lists loaded"
        );

        let day = self.walk_back(start, &sets)?;
        info!(%reference, last_trading_day = %day, "resolved last trading day");
        Ok(day)
    }

    /// Resolve against already-loaded exception sets. No I/O.
    pub fn resolve_with_sets(
        &self,
        reference: impl Into<ReferenceInstant>,
        sets: &ExceptionSets,
    ) -> Result<NaiveDate, CalendarError> {
        let start = self.search_start(reference)?;
        self.walk_back(start, sets)
    }

    /// Latest trading day on or before `start`, within the horizon.
    pub fn walk_back(
        &self,
        start: NaiveDate,
        sets: &ExceptionSets,
    ) -> Result<NaiveDate, CalendarError> {
        let mut candidate = start;
        for _ in 0..self.horizon {
            if sets.is_trading_day(candidate) {
                return Ok(candidate);
            }
            candidate = match candidate.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        Err(CalendarError::NoTradingDayFound {
            start,
            horizon: self.horizon,
        })
    }
}

/// Resolve with the default cutoff (18:30 local) and horizon (365 days).
pub fn resolve_last_trading_day<S: ExceptionSource + ?Sized>(
    reference: impl Into<ReferenceInstant>,
    source: &S,
) -> Result<NaiveDate, CalendarError> {
    LastTradingDayResolver::default().resolve(reference, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{ExceptionListProvider, StaticExceptionLists};
    use chrono::{FixedOffset, TimeZone};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ist(y: i32, m: u32, day: u32, h: u32, min: u32, s: u32) -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(19_800)
            .unwrap()
            .with_ymd_and_hms(y, m, day, h, min, s)
            .unwrap()
    }

    struct FailingProvider;

    impl ExceptionListProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn holidays(&self) -> Result<Vec<NaiveDate>, DataError> {
            Err(DataError::Timeout("holidays".into()))
        }

        fn special_sessions(&self) -> Result<Vec<NaiveDate>, DataError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn before_cutoff_starts_yesterday() {
        let r = LastTradingDayResolver::default();
        assert_eq!(r.search_start(ist(2025, 9, 13, 17, 0, 0)).unwrap(), d(2025, 9, 12));
    }

    #[test]
    fn at_cutoff_starts_today() {
        let r = LastTradingDayResolver::default();
        assert_eq!(r.search_start(ist(2025, 9, 13, 18, 30, 0)).unwrap(), d(2025, 9, 13));
    }

    #[test]
    fn one_millisecond_before_cutoff_starts_yesterday() {
        let r = LastTradingDayResolver::default();
        let t = ist(2025, 9, 13, 18, 29, 59) + chrono::Duration::milliseconds(999);
        assert_eq!(r.search_start(t).unwrap(), d(2025, 9, 12));
    }

    #[test]
    fn custom_cutoff_is_honoured() {
        let r = LastTradingDayResolver::default()
            .with_cutoff(NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(r.search_start(ist(2025, 9, 12, 17, 0, 0)).unwrap(), d(2025, 9, 12));
    }

    #[test]
    fn walk_back_crosses_year_boundary() {
        let sets = ExceptionSets::new([d(2025, 1, 1)], []);
        let r = LastTradingDayResolver::default();
        assert_eq!(r.walk_back(d(2025, 1, 1), &sets).unwrap(), d(2024, 12, 31));
    }

    #[test]
    fn zero_horizon_finds_nothing() {
        let r = LastTradingDayResolver::default().with_horizon(0);
        let err = r.walk_back(d(2025, 9, 12), &ExceptionSets::default()).unwrap_err();
        assert!(matches!(err, CalendarError::NoTradingDayFound { horizon: 0, .. }));
    }

    #[test]
    fn fetch_failure_is_data_unavailable() {
        let err = resolve_last_trading_day(ist(2025, 9, 15, 19, 0, 0), &FailingProvider).unwrap_err();
        assert!(matches!(
            err,
            CalendarError::DataUnavailable(DataError::Timeout(_))
        ));
    }

    #[test]
    fn naive_reference_fails_before_fetching() {
        let naive = d(2025, 9, 13).and_hms_opt(19, 0, 0).unwrap();
        // FailingProvider would produce DataUnavailable if it were consulted.
        let err = resolve_last_trading_day(naive, &FailingProvider).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidInput(_)));
    }

    #[test]
    fn resolves_through_trait_object() {
        let provider: Box<dyn ExceptionListProvider> = Box::new(StaticExceptionLists::empty());
        let day = resolve_last_trading_day(ist(2025, 9, 14, 12, 0, 0), provider.as_ref()).unwrap();
        assert_eq!(day, d(2025, 9, 12));
    }
}
