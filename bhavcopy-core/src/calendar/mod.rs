//! Exchange trading calendar.
//!
//! - `trading_day`: the pure predicate and the exception sets it consults
//! - `session`: exchange-local time (UTC+05:30) and reference instants
//! - `resolver`: cutoff rule plus bounded backward search
//! - `cache`: day-scoped caching of fetched exception lists

pub mod cache;
pub mod resolver;
pub mod session;
pub mod trading_day;

pub use cache::CachedExceptionLists;
pub use resolver::{
    resolve_last_trading_day, CalendarError, LastTradingDayResolver, DEFAULT_HORIZON_DAYS,
};
pub use session::{default_cutoff, exchange_offset, ReferenceInstant, EXCHANGE_UTC_OFFSET_SECS};
pub use trading_day::{is_trading_day, ExceptionSets, ExceptionSource};
