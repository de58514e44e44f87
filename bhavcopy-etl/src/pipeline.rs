//! ETL pipeline: resolve → plan → fetch → adjust → merge → persist.
//!
//! One run:
//! 1. Load the previously persisted dataset (if any) and find its last date
//! 2. Fetch the exception lists once and resolve the last trading day
//! 3. Plan `[start, end]` from the persisted data or the look-back window
//! 4. Pull every trading day in the range from the source
//! 5. Adjust the new rows, append them to the old ones, sort by `DATE`
//! 6. Write the merged dataset atomically
//!
//! A source error on any day aborts the run before anything is written.

use crate::adjust::{Adjuster, NoAdjustment};
use crate::error::EtlError;
use crate::progress::{DayOutcome, LogProgress, PipelineProgress};
use crate::range::{plan_date_range, DateRange};
use crate::source::{BhavcopySource, DATE_COLUMN};
use crate::store::{dataset_max_date, DatasetStore};
use bhavcopy_core::calendar::{
    CalendarError, ExceptionSource, LastTradingDayResolver, ReferenceInstant,
};
use bhavcopy_core::config::{Settings, DEFAULT_LOOKBACK_DAYS};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtlSummary {
    pub last_trading_day: NaiveDate,
    /// `None` when the dataset was already current.
    pub range: Option<DateRange>,
    pub days_requested: usize,
    pub days_fetched: usize,
    /// Trading days in the range for which the source had no bhavcopy.
    pub missing_days: Vec<NaiveDate>,
    pub rows_added: usize,
    pub total_rows: usize,
    /// Latest `DATE` in the persisted dataset after this run.
    pub dataset_end: Option<NaiveDate>,
}

impl EtlSummary {
    pub fn is_up_to_date(&self) -> bool {
        self.range.is_none()
    }

    /// Missing days that later runs will not revisit.
    ///
    /// The next run starts the day after `dataset_end`, so a gap before it
    /// stays a gap. Missing days after it are picked up again.
    pub fn final_missing_days(&self) -> Vec<NaiveDate> {
        match self.dataset_end {
            Some(end) => self.missing_days.iter().copied().filter(|d| *d < end).collect(),
            None => Vec::new(),
        }
    }
}

/// Where a run would start and end, without fetching anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtlPlan {
    pub last_trading_day: NaiveDate,
    pub previous_max: Option<NaiveDate>,
    pub range: Option<DateRange>,
    pub trading_days: Vec<NaiveDate>,
}

pub struct EtlPipeline<'a> {
    exceptions: &'a dyn ExceptionSource,
    source: &'a dyn BhavcopySource,
    store: &'a DatasetStore,
    adjuster: &'a dyn Adjuster,
    progress: &'a dyn PipelineProgress,
    resolver: LastTradingDayResolver,
    lookback_days: u32,
}

impl<'a> EtlPipeline<'a> {
    pub fn new(
        exceptions: &'a dyn ExceptionSource,
        source: &'a dyn BhavcopySource,
        store: &'a DatasetStore,
    ) -> Self {
        Self {
            exceptions,
            source,
            store,
            adjuster: &NoAdjustment,
            progress: &LogProgress,
            resolver: LastTradingDayResolver::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Apply resolver and look-back settings.
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_resolver(settings.calendar.resolver())
            .with_lookback_days(settings.etl.lookback_days)
    }

    pub fn with_resolver(mut self, resolver: LastTradingDayResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_adjuster(mut self, adjuster: &'a dyn Adjuster) -> Self {
        self.adjuster = adjuster;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn PipelineProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Resolve and plan without fetching any bhavcopies or writing.
    pub fn plan(&self, reference: impl Into<ReferenceInstant>) -> Result<EtlPlan, EtlError> {
        let previous = self.store.load()?;
        self.plan_against(reference.into(), previous.as_ref())
    }

    fn plan_against(
        &self,
        reference: ReferenceInstant,
        previous: Option<&DataFrame>,
    ) -> Result<EtlPlan, EtlError> {
        let previous_max = match previous {
            Some(df) => dataset_max_date(df)?,
            None => None,
        };

        // One fetch serves both the resolution and the day enumeration.
        let local_today = reference.to_exchange_time()?.date_naive();
        let sets = self
            .exceptions
            .exception_sets(local_today)
            .map_err(CalendarError::from)?;
        let last_trading_day = self.resolver.resolve_with_sets(reference, &sets)?;

        let range = plan_date_range(last_trading_day, previous_max, self.lookback_days);
        let trading_days = range
            .map(|r| sets.trading_days_between(r.start, r.end))
            .unwrap_or_default();

        Ok(EtlPlan {
            last_trading_day,
            previous_max,
            range,
            trading_days,
        })
    }

    /// Run the full pipeline for `reference`.
    pub fn run(&self, reference: impl Into<ReferenceInstant>) -> Result<EtlSummary, EtlError> {
        let previous = self.store.load()?;
        let plan = self.plan_against(reference.into(), previous.as_ref())?;
        let previous_rows = previous.as_ref().map_or(0, |df| df.height());

        let Some(range) = plan.range else {
            let summary = EtlSummary {
                last_trading_day: plan.last_trading_day,
                range: None,
                days_requested: 0,
                days_fetched: 0,
                missing_days: Vec::new(),
                rows_added: 0,
                total_rows: previous_rows,
                dataset_end: plan.previous_max,
            };
            self.progress.on_complete(&summary);
            return Ok(summary);
        };

        let total = plan.trading_days.len();
        self.progress.on_plan(&range, total);
        info!(source = self.source.name(), %range, "fetching bhavcopies");

        let mut frames = Vec::with_capacity(total);
        let mut missing_days = Vec::new();
        for (i, day) in plan.trading_days.iter().copied().enumerate() {
            match self.source.fetch_day(day)? {
                Some(df) => {
                    self.progress
                        .on_day(day, i, total, DayOutcome::Fetched { rows: df.height() });
                    frames.push(df);
                }
                None => {
                    self.progress.on_day(day, i, total, DayOutcome::Missing);
                    missing_days.push(day);
                }
            }
        }

        let days_fetched = frames.len();
        let mut rows_added = 0;
        let mut total_rows = previous_rows;
        let mut dataset_end = plan.previous_max;

        if let Some(new_rows) = stack(frames)? {
            let adjusted = self.adjuster.adjust(new_rows)?;
            rows_added = adjusted.height();

            let mut merged = match previous {
                Some(prev) => prev
                    .vstack(&adjusted)
                    .map_err(|e| EtlError::Schema(format!("new rows vs stored dataset: {e}")))?,
                None => adjusted,
            };
            merged = merged
                .sort(
                    [DATE_COLUMN],
                    SortMultipleOptions::default().with_maintain_order(true),
                )
                .map_err(|e| EtlError::Schema(format!("sort by {DATE_COLUMN}: {e}")))?;

            let meta = self.store.write(&mut merged)?;
            total_rows = meta.row_count;
            dataset_end = Some(meta.end_date);
        }

        let summary = EtlSummary {
            last_trading_day: plan.last_trading_day,
            range: Some(range),
            days_requested: total,
            days_fetched,
            missing_days,
            rows_added,
            total_rows,
            dataset_end,
        };
        self.progress.on_complete(&summary);
        Ok(summary)
    }
}

/// Concatenate daily frames, `None` when there are none.
fn stack(frames: Vec<DataFrame>) -> Result<Option<DataFrame>, EtlError> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(None);
    };
    for df in iter {
        combined
            .vstack_mut(&df)
            .map_err(|e| EtlError::Schema(format!("daily bhavcopies differ: {e}")))?;
    }
    Ok(Some(combined))
}
