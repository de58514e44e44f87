//! Trading-day predicate and the exception sets it consults.

use crate::data::provider::{DataError, ExceptionListProvider};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Decide whether the exchange trades on `day`.
///
/// A special session always trades, even on a weekend or a listed holiday.
/// Otherwise the day trades iff it is Monday–Friday and not a holiday.
pub fn is_trading_day(
    day: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
    special_sessions: &BTreeSet<NaiveDate>,
) -> bool {
    if special_sessions.contains(&day) {
        return true;
    }
    let is_weekday = !matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
    is_weekday && !holidays.contains(&day)
}

/// The two exception lists for one resolution, as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionSets {
    holidays: BTreeSet<NaiveDate>,
    special_sessions: BTreeSet<NaiveDate>,
}

impl ExceptionSets {
    pub fn new(
        holidays: impl IntoIterator<Item = NaiveDate>,
        special_sessions: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            special_sessions: special_sessions.into_iter().collect(),
        }
    }

    /// Fetch both lists from a provider.
    ///
    /// The two requests run concurrently; neither set is used until both
    /// have arrived.
    pub fn fetch<P: ExceptionListProvider + ?Sized>(provider: &P) -> Result<Self, DataError> {
        let (holidays, special_sessions) =
            rayon::join(|| provider.holidays(), || provider.special_sessions());
        Ok(Self::new(holidays?, special_sessions?))
    }

    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }

    pub fn special_sessions(&self) -> &BTreeSet<NaiveDate> {
        &self.special_sessions
    }

    pub fn is_trading_day(&self, day: NaiveDate) -> bool {
        is_trading_day(day, &self.holidays, &self.special_sessions)
    }

    /// Trading days in `[start, end]`, ascending. Empty when `start > end`.
    pub fn trading_days_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_trading_day(*d))
            .collect()
    }
}

/// Anything that can hand the resolver a pair of exception sets.
///
/// `as_of` is the exchange-local date the resolution is for; plain providers
/// ignore it, caching sources key on it.
pub trait ExceptionSource: Send + Sync {
    fn exception_sets(&self, as_of: NaiveDate) -> Result<ExceptionSets, DataError>;
}

impl<P: ExceptionListProvider + ?Sized> ExceptionSource for P {
    fn exception_sets(&self, _as_of: NaiveDate) -> Result<ExceptionSets, DataError> {
        ExceptionSets::fetch(self)
    }
}
