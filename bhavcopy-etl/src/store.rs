//! Persisted bhavcopy dataset.
//!
//! Layout: one parquet file plus a metadata sidecar next to it.
//! - `{path}`            merged dataset, sorted by `DATE`
//! - `{path}.meta.json`  date range, row count, BLAKE3 of the parquet bytes
//!
//! Writes are atomic (write to .tmp, rename into place). A dataset that fails
//! to decode is quarantined (`{filename}.quarantined`) and treated as absent,
//! so the next run rebuilds it from the look-back window.

use crate::error::EtlError;
use crate::source::DATE_COLUMN;
use bhavcopy_core::data::column_dates;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata sidecar for the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub written_at: NaiveDateTime,
}

/// The parquet dataset store.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the dataset parquet file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the metadata sidecar.
    pub fn meta_path(&self) -> PathBuf {
        sibling(&self.path, "meta.json")
    }

    fn store_err(&self, reason: impl Into<String>) -> EtlError {
        EtlError::Store {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Load the persisted dataset, or `None` if there is none yet.
    ///
    /// Read failures are returned as errors and leave the file alone. Only
    /// bytes that fail to decode or validate are quarantined.
    pub fn load(&self) -> Result<Option<DataFrame>, EtlError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.store_err(format!("read: {e}"))),
        };

        match self.decode(bytes) {
            Ok(df) => Ok(Some(df)),
            Err(e) => {
                let quarantine = sibling(&self.path, "quarantined");
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "quarantining corrupt dataset"
                );
                fs::rename(&self.path, &quarantine)
                    .map_err(|e| self.store_err(format!("quarantine rename: {e}")))?;
                Ok(None)
            }
        }
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<DataFrame, EtlError> {
        let df = ParquetReader::new(Cursor::new(bytes))
            .finish()
            .map_err(|e| self.store_err(format!("decode: {e}")))?;

        if df.column(DATE_COLUMN).is_err() {
            return Err(self.store_err(format!("missing column '{DATE_COLUMN}'")));
        }
        Ok(df)
    }

    /// Latest `DATE` persisted so far.
    pub fn max_date(&self) -> Result<Option<NaiveDate>, EtlError> {
        match self.load()? {
            Some(df) => dataset_max_date(&df),
            None => Ok(None),
        }
    }

    /// Write the dataset, replacing what was there.
    pub fn write(&self, df: &mut DataFrame) -> Result<StoreMeta, EtlError> {
        if df.height() == 0 {
            return Err(self.store_err("no rows to write"));
        }
        let dates = column_dates(df, DATE_COLUMN)?;
        let (Some(start_date), Some(end_date)) =
            (dates.iter().min().copied(), dates.iter().max().copied())
        else {
            return Err(self.store_err("DATE column is entirely null"));
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| self.store_err(format!("failed to create dir: {e}")))?;
        }

        let tmp_path = sibling(&self.path, "tmp");
        write_parquet(df, &tmp_path).map_err(|e| self.store_err(e))?;

        let bytes = fs::read(&tmp_path).map_err(|e| self.store_err(format!("hash read: {e}")))?;
        let data_hash = blake3::hash(&bytes).to_hex().to_string();

        // Atomic rename
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.store_err(format!("atomic rename failed: {e}"))
        })?;

        let meta = StoreMeta {
            start_date,
            end_date,
            row_count: df.height(),
            data_hash,
            written_at: chrono::Utc::now().naive_utc(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| self.store_err(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(), meta_json)
            .map_err(|e| self.store_err(format!("meta write: {e}")))?;

        debug!(path = %self.path.display(), rows = meta.row_count, "dataset written");
        Ok(meta)
    }

    /// Metadata sidecar, if present and readable.
    pub fn get_meta(&self) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }
}

/// Latest `DATE` in a dataset, `None` if the frame has no dated rows.
pub fn dataset_max_date(df: &DataFrame) -> Result<Option<NaiveDate>, EtlError> {
    Ok(column_dates(df, DATE_COLUMN)?.into_iter().max())
}

/// `{path}.{suffix}`, keeping the full original file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Write a DataFrame to a parquet file.
fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), String> {
    let file = fs::File::create(path).map_err(|e| format!("create file: {e}"))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| format!("write parquet: {e}"))?;
    Ok(())
}
