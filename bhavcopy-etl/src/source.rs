//! Daily bhavcopy sources.
//!
//! A source hands back one raw table per trading day. How the file got onto
//! disk (exchange download, unzip, mirror) is outside this crate; the local
//! source only reads what is already there.

use crate::error::EtlError;
use bhavcopy_core::data::date_column;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Column stamped onto every daily frame with the bhavcopy's trading date.
pub const DATE_COLUMN: &str = "DATE";

/// Trait for bhavcopy sources.
pub trait BhavcopySource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Raw table for one trading day, or `None` if nothing was published.
    ///
    /// Returned frames carry a `DATE` column of type `Date`.
    fn fetch_day(&self, date: NaiveDate) -> Result<Option<DataFrame>, EtlError>;
}

/// Reads `{dir}/{YYYY-MM-DD}.csv` files.
///
/// Every CSV column is read as text so frames from different days always
/// stack; typing is left to the adjustment stage.
#[derive(Debug, Clone)]
pub struct LocalBhavcopySource {
    dir: PathBuf,
}

impl LocalBhavcopySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the CSV for `date`.
    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.csv", date.format("%Y-%m-%d")))
    }
}

impl BhavcopySource for LocalBhavcopySource {
    fn name(&self) -> &str {
        "local_csv"
    }

    fn fetch_day(&self, date: NaiveDate) -> Result<Option<DataFrame>, EtlError> {
        let path = self.day_path(date);
        if !path.exists() {
            return Ok(None);
        }

        let source_err = |e: PolarsError| EtlError::Source {
            date,
            reason: format!("{}: {e}", path.display()),
        };

        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(source_err)?
            .finish()
            .map_err(source_err)?;

        let dates = vec![date; df.height()];
        df.with_column(date_column(DATE_COLUMN, &dates)?)
            .map_err(source_err)?;

        Ok(Some(df))
    }
}
