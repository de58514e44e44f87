//! Conversions between polars date columns and `NaiveDate` values.
//!
//! Polars stores `Date` as days since the Unix epoch (i32). Exception lists in
//! the wild also show up as `Datetime` or as ISO-8601 strings, so reads accept
//! all three.

use super::provider::DataError;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::io::Cursor;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Convert a polars day number (days since 1970-01-01) to a date.
pub fn date_from_epoch_days(days: i32) -> Result<NaiveDate, DataError> {
    days.checked_add(UNIX_EPOCH_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| DataError::InvalidDate(format!("day number {days} out of range")))
}

/// Convert a date to a polars day number.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

/// Build a `Date`-typed column from dates.
pub fn date_column(name: &str, dates: &[NaiveDate]) -> Result<Column, DataError> {
    let days: Vec<i32> = dates.iter().copied().map(epoch_days).collect();
    Column::new(name.into(), days)
        .cast(&DataType::Date)
        .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))
}

/// Read the named column of a DataFrame as dates. Nulls are skipped.
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let column = df.column(name).map_err(|_| DataError::MissingColumn {
        column: name.to_string(),
    })?;

    match column.dtype() {
        DataType::Date => date_values(column, name),
        DataType::Datetime(_, _) => {
            let truncated = column
                .cast(&DataType::Date)
                .map_err(|e| DataError::ParquetError(format!("datetime cast: {e}")))?;
            date_values(&truncated, name)
        }
        DataType::String => {
            let ca = column
                .str()
                .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?;
            ca.into_iter()
                .flatten()
                .map(|raw| {
                    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                        .map_err(|e| DataError::InvalidDate(format!("'{raw}' in {name}: {e}")))
                })
                .collect()
        }
        other => Err(DataError::UnsupportedColumnType {
            column: name.to_string(),
            dtype: other.to_string(),
        }),
    }
}

fn date_values(column: &Column, name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let ca = column
        .date()
        .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?;
    (0..ca.len())
        .filter_map(|i| ca.get(i))
        .map(date_from_epoch_days)
        .collect()
}

/// Decode an in-memory parquet file and return one date column.
///
/// Exception-list files are a handful of columns wide, so the whole file is
/// decoded and the column looked up by name afterwards.
pub fn read_date_column(bytes: Vec<u8>, name: &str) -> Result<Vec<NaiveDate>, DataError> {
    let df = ParquetReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    column_dates(&df, name)
}
