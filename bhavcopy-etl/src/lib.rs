//! Bhavcopy ETL: incremental daily-bhavcopy dataset builder.
//!
//! This crate builds on `bhavcopy-core` to provide:
//! - Date-range planning from the last trading day and the persisted dataset
//! - Daily bhavcopy sources (local CSV directory)
//! - Adjustment hook for corporate actions
//! - Atomic parquet dataset store with a BLAKE3 metadata sidecar
//! - The pipeline that ties them together, with progress callbacks

pub mod adjust;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod range;
pub mod source;
pub mod store;

pub use adjust::{Adjuster, NoAdjustment};
pub use error::EtlError;
pub use pipeline::{EtlPipeline, EtlPlan, EtlSummary};
pub use progress::{DayOutcome, LogProgress, PipelineProgress};
pub use range::{plan_date_range, DateRange};
pub use source::{BhavcopySource, LocalBhavcopySource, DATE_COLUMN};
pub use store::{dataset_max_date, DatasetStore, StoreMeta};
