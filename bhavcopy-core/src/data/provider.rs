//! Exception-list provider trait and structured error types.
//!
//! The ExceptionListProvider trait abstracts over where the holiday and
//! special-session lists come from (remote parquet, in-memory fixtures) so the
//! calendar logic can be exercised without network access.

use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and log contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedColumnType { column: String, dtype: String },

    #[error("invalid date value: {0}")]
    InvalidDate(String),
}

/// Trait for sources of the two exchange exception lists.
///
/// Each call returns the full column of dates; duplicates are allowed and are
/// collapsed by the calendar layer.
pub trait ExceptionListProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Weekdays on which the exchange is closed.
    fn holidays(&self) -> Result<Vec<NaiveDate>, DataError>;

    /// Dates on which the exchange trades despite the weekday rule.
    fn special_sessions(&self) -> Result<Vec<NaiveDate>, DataError>;
}

/// In-memory provider, used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticExceptionLists {
    holidays: Vec<NaiveDate>,
    special_sessions: Vec<NaiveDate>,
}

impl StaticExceptionLists {
    pub fn new(holidays: Vec<NaiveDate>, special_sessions: Vec<NaiveDate>) -> Self {
        Self {
            holidays,
            special_sessions,
        }
    }

    /// No holidays and no special sessions: only the weekday rule applies.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ExceptionListProvider for StaticExceptionLists {
    fn name(&self) -> &str {
        "static"
    }

    fn holidays(&self) -> Result<Vec<NaiveDate>, DataError> {
        Ok(self.holidays.clone())
    }

    fn special_sessions(&self) -> Result<Vec<NaiveDate>, DataError> {
        Ok(self.special_sessions.clone())
    }
}
