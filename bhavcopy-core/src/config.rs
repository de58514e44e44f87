//! TOML settings for the calendar and the ETL job.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration pointed at the public exception-list dataset.
//!
//! ```toml
//! [calendar]
//! cutoff = "18:30:00"
//! horizon_days = 365
//!
//! [etl]
//! dataset_path = "data/bhavcopy.parquet"
//! lookback_days = 365
//! ```

use crate::calendar::{default_cutoff, LastTradingDayResolver, DEFAULT_HORIZON_DAYS};
use crate::data::remote::{DEFAULT_DATE_COLUMN, DEFAULT_HOLIDAYS_URL, DEFAULT_SPECIAL_SESSIONS_URL};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default look-back window when no dataset has been persisted yet.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// Upper bound on `etl.lookback_days` (about a century of bhavcopies).
pub const MAX_LOOKBACK_DAYS: u32 = 36_525;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config: {0}")]
    Parse(String),

    #[error("invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub calendar: CalendarSettings,
    pub etl: EtlSettings,
}

/// Where the exception lists live and how resolution behaves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalendarSettings {
    pub holidays_url: String,
    pub special_sessions_url: String,
    pub date_column: String,
    /// Exchange-local publication cutoff.
    pub cutoff: NaiveTime,
    pub horizon_days: u32,
    pub timeout_secs: u64,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            holidays_url: DEFAULT_HOLIDAYS_URL.to_string(),
            special_sessions_url: DEFAULT_SPECIAL_SESSIONS_URL.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            cutoff: default_cutoff(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            timeout_secs: 30,
        }
    }
}

impl CalendarSettings {
    pub fn resolver(&self) -> LastTradingDayResolver {
        LastTradingDayResolver::new(self.cutoff, self.horizon_days)
    }
}

/// Dataset locations for the ETL job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtlSettings {
    pub dataset_path: PathBuf,
    /// Directory of already-downloaded daily bhavcopy CSVs.
    pub raw_dir: PathBuf,
    pub lookback_days: u32,
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/bhavcopy.parquet"),
            raw_dir: PathBuf::from("data/raw"),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::Invalid {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.calendar.horizon_days == 0 {
            return Err(invalid("calendar.horizon_days", "must be at least 1"));
        }
        if self.calendar.timeout_secs == 0 {
            return Err(invalid("calendar.timeout_secs", "must be at least 1"));
        }
        if self.calendar.date_column.trim().is_empty() {
            return Err(invalid("calendar.date_column", "must not be empty"));
        }
        if self.etl.lookback_days == 0 {
            return Err(invalid("etl.lookback_days", "must be at least 1"));
        }
        if self.etl.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid {
                key: "etl.lookback_days".to_string(),
                message: format!("must be at most {MAX_LOOKBACK_DAYS}"),
            });
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.calendar.cutoff, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(s.calendar.horizon_days, 365);
        assert_eq!(s.etl.lookback_days, 365);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let s = Settings::from_toml(
            r#"
[calendar]
cutoff = "17:00:00"
horizon_days = 30

[etl]
dataset_path = "/tmp/out.parquet"
"#,
        )
        .unwrap();

        assert_eq!(s.calendar.cutoff, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(s.calendar.horizon_days, 30);
        assert_eq!(s.calendar.holidays_url, DEFAULT_HOLIDAYS_URL);
        assert_eq!(s.etl.dataset_path, PathBuf::from("/tmp/out.parquet"));
        assert_eq!(s.etl.raw_dir, PathBuf::from("data/raw"));

        let r = s.calendar.resolver();
        assert_eq!(r.horizon(), 30);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = Settings::from_toml("[calendar]\nhorizon_days = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "calendar.horizon_days"));
    }

    #[test]
    fn lookback_is_bounded() {
        let err = Settings::from_toml("[etl]\nlookback_days = 200000000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "etl.lookback_days"));

        let at_limit = format!("[etl]\nlookback_days = {MAX_LOOKBACK_DAYS}\n");
        assert_eq!(
            Settings::from_toml(&at_limit).unwrap().etl.lookback_days,
            MAX_LOOKBACK_DAYS
        );
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            Settings::from_toml("[calendar\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let s = Settings::default();
        let parsed = Settings::from_toml(&s.to_toml().unwrap()).unwrap();
        assert_eq!(s, parsed);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Settings::from_file(Path::new("/nonexistent/bhavcopy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
