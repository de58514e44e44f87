//! Errors from the ETL layer.

use bhavcopy_core::calendar::CalendarError;
use bhavcopy_core::data::DataError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("calendar: {0}")]
    Calendar(#[from] CalendarError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("bhavcopy for {date} unreadable: {reason}")]
    Source { date: NaiveDate, reason: String },

    #[error("dataset store error at {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("schema mismatch: {0}")]
    Schema(String),

    #[error("adjustment '{adjuster}' failed: {reason}")]
    Adjustment { adjuster: String, reason: String },
}
