//! Day-count conventions and trading calendars used to date the pricer.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Day-count convention for year fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCount {
    /// Actual days over a 365-day year.
    #[default]
    Actual365Fixed,
    /// Actual days over a 360-day year.
    Actual360,
}

impl DayCount {
    /// Year fraction from `start` to `end`; negative when `end < start`.
    #[must_use]
    pub fn year_fraction(self, start: NaiveDate, end: NaiveDate) -> f64 {
        let days = (end - start).num_days() as f64;
        match self {
            DayCount::Actual365Fixed => days / 365.0,
            DayCount::Actual360 => days / 360.0,
        }
    }
}

/// Named holiday rule sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    /// Saturday/Sunday weekends only.
    WeekendsOnly,
    /// Taiwan Stock Exchange fixed-date holidays on top of weekends.
    #[default]
    Taiwan,
}

/// Business-day calendar: weekends, rule-based holidays and explicit dates.
///
/// Lunar-calendar holidays have no fixed Gregorian date and must be
/// supplied explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    kind: CalendarKind,
    holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    /// Calendar of the given kind with extra explicit holidays.
    pub fn new<I>(kind: CalendarKind, holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            kind,
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Weekend-only calendar.
    #[must_use]
    pub fn weekends_only() -> Self {
        Self::new(CalendarKind::WeekendsOnly, [])
    }

    /// Taiwan exchange calendar with only its fixed-date holidays.
    #[must_use]
    pub fn taiwan() -> Self {
        Self::new(CalendarKind::Taiwan, [])
    }

    /// Rule set this calendar applies.
    pub fn kind(&self) -> CalendarKind {
        self.kind
    }

    /// True for weekends and holidays.
    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return true;
        }
        if self.holidays.contains(&date) {
            return true;
        }
        match self.kind {
            CalendarKind::WeekendsOnly => false,
            CalendarKind::Taiwan => is_taiwan_fixed_holiday(date),
        }
    }

    /// True when the exchange is open on `date`.
    #[must_use]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_holiday(date)
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::taiwan()
    }
}

fn is_taiwan_fixed_holiday(date: NaiveDate) -> bool {
    matches!(
        (date.month(), date.day()),
        // New Year's Day, Peace Memorial Day, Labour Day, National Day
        (1, 1) | (2, 28) | (5, 1) | (10, 10)
    )
}
