//! Remote parquet exception lists.
//!
//! The exchange's holiday and special-session lists are published as two small
//! parquet files, each with a `Date` column. Both are fetched over HTTP and
//! decoded in memory. There is no retry here: a failed fetch surfaces as a
//! `DataError` and retry policy belongs to the caller.

use super::columns::read_date_column;
use super::provider::{DataError, ExceptionListProvider};
use crate::config::CalendarSettings;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_HOLIDAYS_URL: &str =
    "https://huggingface.co/datasets/MSM02/bhavcopy-calendar/resolve/main/data/Holidays/Holidays.parquet";

pub const DEFAULT_SPECIAL_SESSIONS_URL: &str =
    "https://huggingface.co/datasets/MSM02/bhavcopy-calendar/resolve/main/data/SpecialSessions/Special%20Sessions.parquet";

pub const DEFAULT_DATE_COLUMN: &str = "Date";

/// Exception lists read from two remotely hosted parquet files.
pub struct RemoteParquetLists {
    client: reqwest::blocking::Client,
    holidays_url: String,
    special_sessions_url: String,
    date_column: String,
}

impl RemoteParquetLists {
    pub fn new(
        holidays_url: impl Into<String>,
        special_sessions_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bhavcopy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            holidays_url: holidays_url.into(),
            special_sessions_url: special_sessions_url.into(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
        })
    }

    /// Provider configured from the `[calendar]` settings section.
    pub fn from_settings(settings: &CalendarSettings) -> Result<Self, DataError> {
        Ok(Self::new(
            &settings.holidays_url,
            &settings.special_sessions_url,
            Duration::from_secs(settings.timeout_secs),
        )?
        .with_date_column(&settings.date_column))
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    pub fn holidays_url(&self) -> &str {
        &self.holidays_url
    }

    pub fn special_sessions_url(&self) -> &str {
        &self.special_sessions_url
    }

    /// Download one parquet file and return its date column.
    pub fn fetch_column(&self, url: &str) -> Result<Vec<NaiveDate>, DataError> {
        debug!(url, column = %self.date_column, "fetching exception list");

        let resp = self.client.get(url).send().map_err(|e| classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().map_err(|e| classify(url, e))?;
        let dates = read_date_column(body.to_vec(), &self.date_column)?;

        debug!(url, count = dates.len(), "exception list decoded");
        Ok(dates)
    }
}

/// Map a transport failure onto the data error taxonomy.
fn classify(url: &str, e: reqwest::Error) -> DataError {
    if e.is_timeout() {
        DataError::Timeout(format!("{url}: {e}"))
    } else {
        DataError::NetworkUnreachable(format!("{url}: {e}"))
    }
}

impl ExceptionListProvider for RemoteParquetLists {
    fn name(&self) -> &str {
        "remote_parquet"
    }

    fn holidays(&self) -> Result<Vec<NaiveDate>, DataError> {
        self.fetch_column(&self.holidays_url)
    }

    fn special_sessions(&self) -> Result<Vec<NaiveDate>, DataError> {
        self.fetch_column(&self.special_sessions_url)
    }
}
