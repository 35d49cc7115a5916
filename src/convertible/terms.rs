//! Bond terms and run-level configuration.
//!
//! Everything here is fixed once at startup and shared read-only by every
//! pricing call of the run.

use super::calendar::{CalendarKind, DayCount, TradingCalendar};
use super::implied_volatility::SolverConfig;
use crate::market::SeriesAligner;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading or validating the run configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Calendar dates are inconsistent with each other.
    InvalidDates {
        /// Description of the inconsistency.
        message: String,
    },

    /// A contractual or market parameter is out of range.
    InvalidTerms {
        /// Description of the invalid parameter.
        message: String,
    },

    /// The configuration document could not be parsed.
    Parse {
        /// Underlying parser message.
        message: String,
    },

    /// The configuration file could not be read.
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDates { message } => write!(f, "invalid dates: {message}"),
            ConfigError::InvalidTerms { message } => write!(f, "invalid terms: {message}"),
            ConfigError::Parse { message } => write!(f, "invalid configuration: {message}"),
            ConfigError::Io { path, message } => {
                write!(f, "cannot read configuration {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Contractual terms of the convertible bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertibleTerms {
    /// Stock price at which 100 of face converts; the option strike.
    pub conversion_price: f64,
    /// Fixed annual coupon in percentage points.
    pub coupon_rate: f64,
    /// Holder put date, used as the option maturity.
    pub put_date: NaiveDate,
    /// Date from which conversion became effective.
    pub conversion_effective_date: NaiveDate,
    /// Reference date for the bond-floor amortization.
    pub evaluation_date: NaiveDate,
    /// Amortization horizon multiplier in the years-left formula.
    pub years_left_multiplier: f64,
}

impl Default for ConvertibleTerms {
    fn default() -> Self {
        Self {
            conversion_price: 295.0,
            coupon_rate: 3.25,
            put_date: date(2028, 3, 29),
            conversion_effective_date: date(2023, 3, 29),
            evaluation_date: date(2023, 7, 19),
            years_left_multiplier: 5.0,
        }
    }
}

impl ConvertibleTerms {
    /// Shares received per 100 of face value.
    #[must_use]
    pub fn conversion_ratio(&self) -> f64 {
        100.0 / self.conversion_price
    }

    /// Remaining amortization years of the bond floor.
    ///
    /// `multiplier * (put - evaluation) / (put - conversion_effective)`, in days.
    #[must_use]
    pub fn years_left(&self) -> f64 {
        let remaining = (self.put_date - self.evaluation_date).num_days() as f64;
        let span = (self.put_date - self.conversion_effective_date).num_days() as f64;
        self.years_left_multiplier * remaining / span
    }

    /// Checks the terms can be used for the whole run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conversion_price <= 0.0 {
            return Err(ConfigError::InvalidTerms {
                message: format!(
                    "conversion price must be positive, got {}",
                    self.conversion_price
                ),
            });
        }
        if self.put_date <= self.conversion_effective_date {
            return Err(ConfigError::InvalidDates {
                message: format!(
                    "put date {} must be after conversion effective date {}",
                    self.put_date, self.conversion_effective_date
                ),
            });
        }
        Ok(())
    }
}

/// Immutable configuration of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Bond terms.
    pub terms: ConvertibleTerms,
    /// Flat continuously-compounded risk-free rate.
    pub risk_free_rate: f64,
    /// First date on which conversion may be exercised.
    pub first_exercise_date: NaiveDate,
    /// Holiday rule set of the underlying's exchange.
    pub calendar: CalendarKind,
    /// Extra exchange holidays.
    pub holidays: Vec<NaiveDate>,
    /// Day-count convention for times to maturity.
    pub day_count: DayCount,
    /// Offset of exchange local time from UTC, in hours.
    pub utc_offset_hours: i32,
    /// Rows at or before this local time are dropped.
    pub session_cutoff: NaiveTime,
    /// Lattice steps of the American pricer.
    pub binomial_steps: usize,
    /// Implied volatility solver settings.
    pub solver: SolverConfig,
    /// Worker threads for the row-wise solve.
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            terms: ConvertibleTerms::default(),
            risk_free_rate: 0.011575,
            first_exercise_date: date(2023, 6, 30),
            calendar: CalendarKind::Taiwan,
            holidays: Vec::new(),
            day_count: DayCount::Actual365Fixed,
            utc_offset_hours: 8,
            session_cutoff: NaiveTime::from_hms_opt(8, 59, 0).unwrap_or_default(),
            binomial_steps: 200,
            solver: SolverConfig::default(),
            workers: 1,
        }
    }
}

impl RunConfig {
    /// Parses and validates a JSON configuration; absent fields take defaults.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(data).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&data)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })
    }

    /// Checks the configuration is usable for a whole run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terms.validate()?;

        if self.first_exercise_date > self.terms.put_date {
            return Err(ConfigError::InvalidDates {
                message: format!(
                    "first exercise date {} is after put date {}",
                    self.first_exercise_date, self.terms.put_date
                ),
            });
        }
        if self.solver.initial_guess <= 0.0 {
            return Err(ConfigError::InvalidTerms {
                message: format!(
                    "initial volatility guess must be positive, got {}",
                    self.solver.initial_guess
                ),
            });
        }
        if self.binomial_steps == 0 {
            return Err(ConfigError::InvalidTerms {
                message: "binomial steps must be > 0".to_string(),
            });
        }
        if self.solver.min_iv <= 0.0 || self.solver.min_iv >= self.solver.max_iv {
            return Err(ConfigError::InvalidTerms {
                message: format!(
                    "solver bounds must satisfy 0 < min < max, got [{}, {}]",
                    self.solver.min_iv, self.solver.max_iv
                ),
            });
        }
        self.utc_offset()?;
        Ok(())
    }

    /// Exchange local-time offset.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::InvalidTerms {
                message: format!("utc offset {}h is out of range", self.utc_offset_hours),
            }
        })
    }

    /// Trading calendar with the configured extra holidays.
    #[must_use]
    pub fn trading_calendar(&self) -> TradingCalendar {
        TradingCalendar::new(self.calendar, self.holidays.iter().copied())
    }

    /// Series aligner for the configured timezone and session.
    pub fn aligner(&self) -> Result<SeriesAligner, ConfigError> {
        Ok(SeriesAligner::new(self.utc_offset()?, self.session_cutoff))
    }
}
