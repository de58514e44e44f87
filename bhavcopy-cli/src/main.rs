//! Bhavcopy CLI: last-trading-day lookup and dataset ETL commands.
//!
//! Commands:
//! - `last-trading-day`: latest day whose bhavcopy should be published
//! - `is-trading-day`: check one date against the exchange calendar
//! - `trading-days`: list trading days in an inclusive range
//! - `plan`: show the range the next ETL run would fetch
//! - `run`: fetch, adjust, and append bhavcopies to the dataset
//! - `store status`: report the persisted dataset's range and size
//!
//! This binary is the only place that reads the system clock: every command
//! that needs a reference instant takes `--at` and falls back to now.

use anyhow::{bail, Context, Result};
use bhavcopy_core::calendar::{ExceptionSets, ReferenceInstant};
use bhavcopy_core::config::Settings;
use bhavcopy_core::data::RemoteParquetLists;
use bhavcopy_etl::{DatasetStore, EtlPipeline, EtlPlan, EtlSummary, LocalBhavcopySource};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bhavcopy",
    about = "Bhavcopy CLI: exchange calendar and daily bhavcopy ETL"
)]
struct Cli {
    /// Path to a TOML settings file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the latest trading day whose bhavcopy should exist.
    LastTradingDay {
        #[command(flatten)]
        reference: ReferenceArgs,

        /// Publication cutoff in exchange-local time (HH:MM or HH:MM:SS).
        #[arg(long, value_parser = parse_cutoff)]
        cutoff: Option<NaiveTime>,

        /// Maximum number of days to search backwards.
        #[arg(long)]
        horizon: Option<u32>,
    },
    /// Check whether a date is a trading day.
    IsTradingDay {
        /// Date to check (YYYY-MM-DD).
        date: NaiveDate,
    },
    /// List the trading days between two dates, inclusive.
    TradingDays {
        /// First date (YYYY-MM-DD).
        start: NaiveDate,

        /// Last date (YYYY-MM-DD).
        end: NaiveDate,
    },
    /// Show the date range the next run would fetch, without fetching it.
    Plan {
        #[command(flatten)]
        reference: ReferenceArgs,

        #[command(flatten)]
        etl: EtlArgs,

        /// Print the plan as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch missing bhavcopies and append them to the dataset.
    Run {
        #[command(flatten)]
        reference: ReferenceArgs,

        #[command(flatten)]
        etl: EtlArgs,

        /// Directory of daily `YYYY-MM-DD.csv` bhavcopies.
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dataset management commands.
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Report the dataset's date range, row count, and size.
    Status {
        /// Dataset parquet file. Overrides `etl.dataset_path`.
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ReferenceArgs {
    /// Reference instant, RFC 3339 with offset (e.g. 2025-09-12T18:30:00+05:30).
    /// Defaults to now.
    #[arg(long)]
    at: Option<String>,
}

impl ReferenceArgs {
    fn instant(&self) -> Result<ReferenceInstant> {
        match self.at.as_deref() {
            Some(text) => Ok(ReferenceInstant::parse(text)?),
            None => Ok(ReferenceInstant::from(Utc::now())),
        }
    }
}

#[derive(Args)]
struct EtlArgs {
    /// Dataset parquet file. Overrides `etl.dataset_path`.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Days to look back when there is no dataset yet. Overrides `etl.lookback_days`.
    #[arg(long)]
    lookback_days: Option<u32>,
}

impl EtlArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.dataset {
            settings.etl.dataset_path = path.clone();
        }
        if let Some(days) = self.lookback_days {
            settings.etl.lookback_days = days;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())
        .with_context(|| "failed to load settings")?;
    debug!(config = ?cli.config, "settings loaded");

    match cli.command {
        Commands::LastTradingDay {
            reference,
            cutoff,
            horizon,
        } => {
            if let Some(cutoff) = cutoff {
                settings.calendar.cutoff = cutoff;
            }
            if let Some(horizon) = horizon {
                settings.calendar.horizon_days = horizon;
            }
            settings.validate()?;
            run_last_trading_day(&settings, reference.instant()?)
        }
        Commands::IsTradingDay { date } => run_is_trading_day(&settings, date),
        Commands::TradingDays { start, end } => run_trading_days(&settings, start, end),
        Commands::Plan {
            reference,
            etl,
            json,
        } => {
            etl.apply(&mut settings);
            settings.validate()?;
            run_plan(&settings, reference.instant()?, json)
        }
        Commands::Run {
            reference,
            etl,
            raw_dir,
            json,
        } => {
            etl.apply(&mut settings);
            if let Some(dir) = raw_dir {
                settings.etl.raw_dir = dir;
            }
            settings.validate()?;
            run_etl(&settings, reference.instant()?, json)
        }
        Commands::Store { action } => match action {
            StoreAction::Status { dataset } => {
                let path = dataset.unwrap_or_else(|| settings.etl.dataset_path.clone());
                run_store_status(&path)
            }
        },
    }
}

fn exception_lists(settings: &Settings) -> Result<RemoteParquetLists> {
    RemoteParquetLists::from_settings(&settings.calendar)
        .context("failed to build exception-list client")
}

fn run_last_trading_day(settings: &Settings, reference: ReferenceInstant) -> Result<()> {
    let lists = exception_lists(settings)?;
    let day = settings.calendar.resolver().resolve(reference, &lists)?;
    println!("{day}");
    Ok(())
}

fn run_is_trading_day(settings: &Settings, date: NaiveDate) -> Result<()> {
    let sets = ExceptionSets::fetch(&exception_lists(settings)?)?;
    if sets.is_trading_day(date) {
        println!("{date} ({}) is a trading day", date.format("%a"));
    } else {
        println!("{date} ({}) is not a trading day", date.format("%a"));
    }
    Ok(())
}

fn run_trading_days(settings: &Settings, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        bail!("start {start} is after end {end}");
    }
    let sets = ExceptionSets::fetch(&exception_lists(settings)?)?;
    for day in sets.trading_days_between(start, end) {
        println!("{day}");
    }
    Ok(())
}

fn run_plan(settings: &Settings, reference: ReferenceInstant, json: bool) -> Result<()> {
    let lists = exception_lists(settings)?;
    let source = LocalBhavcopySource::new(&settings.etl.raw_dir);
    let store = DatasetStore::new(&settings.etl.dataset_path);

    let plan = EtlPipeline::new(&lists, &source, &store)
        .with_settings(settings)
        .plan(reference)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn run_etl(settings: &Settings, reference: ReferenceInstant, json: bool) -> Result<()> {
    let lists = exception_lists(settings)?;
    let source = LocalBhavcopySource::new(&settings.etl.raw_dir);
    let store = DatasetStore::new(&settings.etl.dataset_path);

    let summary = EtlPipeline::new(&lists, &source, &store)
        .with_settings(settings)
        .run(reference)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &store);
    }
    Ok(())
}

fn run_store_status(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("Dataset does not exist: {}", path.display());
        return Ok(());
    }

    let store = DatasetStore::new(path);
    let size = std::fs::metadata(path)?.len();

    println!("Dataset: {}", path.display());
    println!("Size:    {}", format_size(size));
    match store.get_meta() {
        Some(meta) => {
            println!("Range:   {} to {}", meta.start_date, meta.end_date);
            println!("Rows:    {}", meta.row_count);
            println!("Hash:    {}", meta.data_hash);
            println!("Written: {}", meta.written_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("(no readable metadata sidecar)"),
    }
    Ok(())
}

fn print_plan(plan: &EtlPlan) {
    println!("Last trading day: {}", plan.last_trading_day);
    match plan.previous_max {
        Some(max) => println!("Dataset through:  {max}"),
        None => println!("Dataset through:  (none)"),
    }
    match plan.range {
        Some(range) => {
            println!("Range to fetch:   {range}");
            println!("Trading days:     {}", plan.trading_days.len());
        }
        None => println!("Dataset is up to date."),
    }
}

fn print_summary(summary: &EtlSummary, store: &DatasetStore) {
    println!();
    println!("=== Bhavcopy ETL ===");
    println!("Last trading day: {}", summary.last_trading_day);
    let Some(range) = summary.range else {
        println!("Dataset is up to date ({} rows).", summary.total_rows);
        return;
    };
    println!("Range:            {range}");
    println!(
        "Days:             {} fetched / {} requested",
        summary.days_fetched, summary.days_requested
    );
    if !summary.missing_days.is_empty() {
        let missing: Vec<String> = summary.missing_days.iter().map(|d| d.to_string()).collect();
        println!("Missing:          {}", missing.join(", "));
        let gaps = summary.final_missing_days();
        if !gaps.is_empty() {
            println!(
                "                  {} of these precede the dataset end and will not be retried",
                gaps.len()
            );
        }
    }
    println!("Rows added:       {}", summary.rows_added);
    println!("Total rows:       {}", summary.total_rows);
    println!("Dataset:          {}", store.path().display());
}

fn parse_cutoff(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("invalid cutoff '{s}', expected HH:MM or HH:MM:SS"))
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_accepts_minutes_and_seconds() {
        assert_eq!(
            parse_cutoff("18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert_eq!(
            parse_cutoff("17:45:30").unwrap(),
            NaiveTime::from_hms_opt(17, 45, 30).unwrap()
        );
        assert!(parse_cutoff("6pm").is_err());
    }

    #[test]
    fn reference_defaults_to_aware_now() {
        let args = ReferenceArgs { at: None };
        assert!(args.instant().unwrap().is_aware());
    }

    #[test]
    fn reference_without_offset_is_naive() {
        let args = ReferenceArgs {
            at: Some("2025-09-12T18:30:00".into()),
        };
        assert!(!args.instant().unwrap().is_aware());
    }

    #[test]
    fn etl_args_override_settings() {
        let mut settings = Settings::default();
        EtlArgs {
            dataset: Some(PathBuf::from("/tmp/out.parquet")),
            lookback_days: Some(30),
        }
        .apply(&mut settings);
        assert_eq!(settings.etl.dataset_path, PathBuf::from("/tmp/out.parquet"));
        assert_eq!(settings.etl.lookback_days, 30);
    }

    #[test]
    fn cli_parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bhavcopy",
            "last-trading-day",
            "--at",
            "2025-09-14T12:00:00+05:30",
            "--config",
            "bhavcopy.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bhavcopy.toml")));
        assert!(matches!(cli.command, Commands::LastTradingDay { .. }));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
