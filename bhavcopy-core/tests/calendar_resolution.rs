//! End-to-end resolution scenarios against fixed exception lists.

use bhavcopy_core::calendar::{
    resolve_last_trading_day, CachedExceptionLists, CalendarError, LastTradingDayResolver,
};
use bhavcopy_core::data::{DataError, ExceptionListProvider, StaticExceptionLists};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ist(y: i32, m: u32, day: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(19_800)
        .unwrap()
        .with_ymd_and_hms(y, m, day, h, min, 0)
        .unwrap()
}

fn no_exceptions() -> StaticExceptionLists {
    StaticExceptionLists::empty()
}

#[test]
fn exact_cutoff_on_trading_day_returns_same_day() {
    // Friday 2025-09-12, 18:30 sharp.
    let day = resolve_last_trading_day(ist(2025, 9, 12, 18, 30), &no_exceptions()).unwrap();
    assert_eq!(day, d(2025, 9, 12));
}

#[test]
fn exact_cutoff_on_saturday_walks_back_to_friday() {
    let day = resolve_last_trading_day(ist(2025, 9, 13, 18, 30), &no_exceptions()).unwrap();
    assert_eq!(day, d(2025, 9, 12));
}

#[test]
fn before_cutoff_uses_previous_day() {
    // Tuesday 17:00: Monday's file is the latest.
    let day = resolve_last_trading_day(ist(2025, 9, 16, 17, 0), &no_exceptions()).unwrap();
    assert_eq!(day, d(2025, 9, 15));
}

#[test]
fn sunday_noon_returns_friday() {
    let day = resolve_last_trading_day(ist(2025, 9, 14, 12, 0), &no_exceptions()).unwrap();
    assert_eq!(day, d(2025, 9, 12));
}

#[test]
fn consecutive_holidays_are_skipped() {
    let lists = StaticExceptionLists::new(vec![d(2025, 10, 1), d(2025, 10, 2)], vec![]);
    let day = resolve_last_trading_day(ist(2025, 10, 2, 16, 0), &lists).unwrap();
    assert_eq!(day, d(2025, 9, 30));
}

#[test]
fn utc_instant_is_converted_before_cutoff_check() {
    // 19:00 UTC on Saturday 2025-10-04 is 00:30 IST Sunday: before cutoff,
    // search starts Saturday and lands on Friday.
    let holidays = StaticExceptionLists::new(vec![d(2025, 10, 2)], vec![]);
    let reference = Utc.with_ymd_and_hms(2025, 10, 4, 19, 0, 0).unwrap();
    let day = resolve_last_trading_day(reference, &holidays).unwrap();
    assert_eq!(day, d(2025, 10, 3));
}

#[test]
fn weekend_special_session_is_found() {
    // Muhurat-style Saturday session.
    let lists = StaticExceptionLists::new(vec![], vec![d(2025, 9, 13)]);
    let day = resolve_last_trading_day(ist(2025, 9, 14, 12, 0), &lists).unwrap();
    assert_eq!(day, d(2025, 9, 13));
}

#[test]
fn search_crosses_year_boundary() {
    let lists = StaticExceptionLists::new(vec![d(2025, 1, 1)], vec![]);
    let day = resolve_last_trading_day(ist(2025, 1, 2, 9, 0), &lists).unwrap();
    assert_eq!(day, d(2024, 12, 31));
}

#[test]
fn naive_reference_is_invalid_input() {
    let naive = d(2025, 9, 13).and_hms_opt(19, 0, 0).unwrap();
    let err = resolve_last_trading_day(naive, &no_exceptions()).unwrap_err();
    assert!(matches!(err, CalendarError::InvalidInput(_)), "got {err:?}");
}

#[test]
fn every_weekday_a_holiday_exhausts_horizon() {
    let start = d(2024, 1, 1);
    let holidays: Vec<NaiveDate> = start.iter_days().take(800).collect();
    let lists = StaticExceptionLists::new(holidays, vec![]);

    let err = resolve_last_trading_day(ist(2025, 9, 14, 12, 0), &lists).unwrap_err();
    match err {
        CalendarError::NoTradingDayFound { start, horizon } => {
            assert_eq!(start, d(2025, 9, 13));
            assert_eq!(horizon, 365);
        }
        other => panic!("expected NoTradingDayFound, got {other:?}"),
    }
}

#[test]
fn small_horizon_exhausts_over_weekend() {
    // Sunday noon: candidates are Saturday then Friday. A horizon of one
    // never reaches Friday.
    let resolver = LastTradingDayResolver::default().with_horizon(1);
    let err = resolver
        .resolve(ist(2025, 9, 14, 12, 0), &no_exceptions())
        .unwrap_err();
    assert!(matches!(
        err,
        CalendarError::NoTradingDayFound { horizon: 1, .. }
    ));

    let resolver = resolver.with_horizon(2);
    assert_eq!(
        resolver.resolve(ist(2025, 9, 14, 12, 0), &no_exceptions()).unwrap(),
        d(2025, 9, 12)
    );
}

struct Unreachable;

impl ExceptionListProvider for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn holidays(&self) -> Result<Vec<NaiveDate>, DataError> {
        Ok(vec![])
    }

    fn special_sessions(&self) -> Result<Vec<NaiveDate>, DataError> {
        Err(DataError::Http {
            url: "https://example.invalid/Special%20Sessions.parquet".into(),
            status: 503,
        })
    }
}

#[test]
fn partial_fetch_failure_is_data_unavailable() {
    let err = resolve_last_trading_day(ist(2025, 9, 14, 12, 0), &Unreachable).unwrap_err();
    assert!(
        matches!(err, CalendarError::DataUnavailable(DataError::Http { status: 503, .. })),
        "got {err:?}"
    );
}

#[test]
fn cached_provider_resolves_like_uncached() {
    let lists = StaticExceptionLists::new(vec![d(2025, 10, 2)], vec![]);
    let cached = CachedExceptionLists::new(lists.clone());

    for h in [0, 9, 18, 23] {
        let reference = ist(2025, 10, 3, h, 0);
        assert_eq!(
            resolve_last_trading_day(reference, &cached).unwrap(),
            resolve_last_trading_day(reference, &lists).unwrap()
        );
    }
    assert_eq!(cached.cached_for(), Some(d(2025, 10, 3)));
}

#[test]
fn result_is_always_a_weekday_without_sessions() {
    for offset in 0..30 {
        let day = d(2025, 1, 1) + chrono::Duration::days(offset);
        let reference = ist(day.year(), day.month(), day.day(), 12, 0);
        let resolved = resolve_last_trading_day(reference, &no_exceptions()).unwrap();
        assert!(resolved.weekday().num_days_from_monday() < 5);
        assert!(resolved < day);
    }
}
