//! Progress reporting for pipeline runs.

use crate::pipeline::EtlSummary;
use crate::range::DateRange;
use chrono::NaiveDate;
use tracing::{info, warn};

/// What happened to one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    Fetched { rows: usize },
    Missing,
}

/// Callbacks for a pipeline run.
pub trait PipelineProgress: Send + Sync {
    /// Called once the range and the trading days in it are known.
    fn on_plan(&self, range: &DateRange, trading_days: usize);

    /// Called after each trading day is fetched (or found missing).
    fn on_day(&self, date: NaiveDate, index: usize, total: usize, outcome: DayOutcome);

    /// Called when the run is done.
    fn on_complete(&self, summary: &EtlSummary);
}

/// Progress reporter that writes to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl PipelineProgress for LogProgress {
    fn on_plan(&self, range: &DateRange, trading_days: usize) {
        info!(%range, trading_days, "planned bhavcopy range");
    }

    fn on_day(&self, date: NaiveDate, index: usize, total: usize, outcome: DayOutcome) {
        match outcome {
            DayOutcome::Fetched { rows } => {
                info!("[{}/{}] {date}: {rows} rows", index + 1, total)
            }
            DayOutcome::Missing => warn!("[{}/{}] {date}: no bhavcopy available", index + 1, total),
        }
    }

    fn on_complete(&self, summary: &EtlSummary) {
        let gaps = summary.final_missing_days();
        if !gaps.is_empty() {
            warn!(
                days = gaps.len(),
                first = %gaps[0],
                "missing bhavcopies before the dataset end will not be retried"
            );
        }
        match summary.range {
            None => info!(last_trading_day = %summary.last_trading_day, "dataset already up to date"),
            Some(range) => info!(
                %range,
                fetched = summary.days_fetched,
                missing = summary.missing_days.len(),
                rows_added = summary.rows_added,
                total_rows = summary.total_rows,
                "bhavcopy run complete"
            ),
        }
    }
}
