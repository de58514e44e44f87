//! Exchange-local time and reference instants.
//!
//! All date arithmetic happens in exchange time, a fixed UTC+05:30 offset with
//! no daylight saving. A reference instant that carries no offset cannot be
//! placed on that clock, so it is represented explicitly and rejected rather
//! than guessed.

use super::resolver::CalendarError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Exchange offset from UTC in seconds (+05:30).
pub const EXCHANGE_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The exchange's local timezone.
pub fn exchange_offset() -> FixedOffset {
    FixedOffset::east_opt(EXCHANGE_UTC_OFFSET_SECS).expect("+05:30 is a valid offset")
}

/// Local time after which the current day's bhavcopy is presumed published.
pub fn default_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 30, 0).expect("18:30:00 is a valid time")
}

/// A point in time as supplied by a caller, possibly without a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceInstant {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ReferenceInstant {
    /// Parse RFC 3339 text. Text without an offset parses to `Naive`.
    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Aware(dt));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self::Naive(naive));
            }
        }
        Err(CalendarError::InvalidInput(format!(
            "'{s}' is not an RFC 3339 timestamp"
        )))
    }

    pub fn is_aware(&self) -> bool {
        matches!(self, Self::Aware(_))
    }

    /// The instant on the exchange clock. Fails for naive instants.
    pub fn to_exchange_time(&self) -> Result<DateTime<FixedOffset>, CalendarError> {
        match self {
            Self::Aware(dt) => Ok(dt.with_timezone(&exchange_offset())),
            Self::Naive(naive) => Err(CalendarError::InvalidInput(format!(
                "reference instant {naive} must be timezone-aware"
            ))),
        }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ReferenceInstant {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Aware(dt.fixed_offset())
    }
}

impl From<NaiveDateTime> for ReferenceInstant {
    fn from(naive: NaiveDateTime) -> Self {
        Self::Naive(naive)
    }
}

impl FromStr for ReferenceInstant {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReferenceInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aware(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Naive(naive) => write!(f, "{naive} (no timezone)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike, Utc};

    #[test]
    fn utc_is_shifted_to_exchange_time() {
        let utc = Utc.with_ymd_and_hms(2025, 10, 4, 19, 0, 0).unwrap();
        let local = ReferenceInstant::from(utc).to_exchange_time().unwrap();

        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2025, 10, 5).unwrap());
        assert_eq!((local.hour(), local.minute()), (0, 30));
        assert_eq!(local.offset().local_minus_utc(), EXCHANGE_UTC_OFFSET_SECS);
    }

    #[test]
    fn naive_instant_is_rejected() {
        let naive = NaiveDate::from_ymd_opt(2025, 9, 13)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        let err = ReferenceInstant::from(naive).to_exchange_time().unwrap_err();
        assert!(matches!(err, CalendarError::InvalidInput(ref m) if m.contains("timezone-aware")));
    }

    #[test]
    fn parses_offset_and_naive_text() {
        assert!(ReferenceInstant::parse("2025-09-13T18:30:00+05:30")
            .unwrap()
            .is_aware());
        assert!(ReferenceInstant::parse("2025-09-13T13:00:00Z")
            .unwrap()
            .is_aware());
        assert!(!ReferenceInstant::parse("2025-09-13T18:30:00")
            .unwrap()
            .is_aware());
        assert!(!ReferenceInstant::parse("2025-09-13 18:30:00")
            .unwrap()
            .is_aware());
    }

    #[test]
    fn garbage_text_is_invalid_input() {
        assert!(matches!(
            "yesterday".parse::<ReferenceInstant>(),
            Err(CalendarError::InvalidInput(_))
        ));
    }

    #[test]
    fn default_cutoff_is_half_past_six() {
        assert_eq!(default_cutoff(), NaiveTime::from_hms_opt(18, 30, 0).unwrap());
    }
}
