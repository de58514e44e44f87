//! Bhavcopy Core: exchange calendar and exception-list providers.
//!
//! This crate answers one question: what is the latest trading day whose
//! bhavcopy should exist as of a given instant?
//! - Pure trading-day predicate (weekday rule, holidays, special sessions)
//! - Last-trading-day resolver with an 18:30 IST cutoff and bounded search
//! - Exception-list providers (remote parquet, static, day-scoped cache)
//! - TOML settings shared with the ETL and CLI crates

pub mod calendar;
pub mod config;
pub mod data;

pub use calendar::{
    is_trading_day, resolve_last_trading_day, CachedExceptionLists, CalendarError, ExceptionSets,
    ExceptionSource, LastTradingDayResolver, ReferenceInstant,
};
pub use config::{CalendarSettings, ConfigError, EtlSettings, Settings};
pub use data::{DataError, ExceptionListProvider, RemoteParquetLists, StaticExceptionLists};
