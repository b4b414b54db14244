//! Reporting windows.
//!
//! A window is a closed date interval, normally one calendar year. Every
//! metric is computed for a "current" window and for the window one year
//! earlier, which supplies the change-widget baseline.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Number of days in a calendar year: 366 for leap years, else 365.
#[must_use]
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// A closed `[start, end]` date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportingWindow {
    /// The window `[year-01-01, year-12-31]`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidYear`] if the year, or the year
    /// before it, is outside the representable date range.
    pub fn calendar_year(year: i32) -> Result<Self, AnalyticsError> {
        let bounds = |y: i32| {
            NaiveDate::from_ymd_opt(y, 1, 1).zip(NaiveDate::from_ymd_opt(y, 12, 31))
        };

        let (start, end) = bounds(year).ok_or(AnalyticsError::InvalidYear { year })?;
        if year.checked_sub(1).and_then(bounds).is_none() {
            return Err(AnalyticsError::InvalidYear { year });
        }

        Ok(Self { start, end })
    }

    /// An arbitrary closed window.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidWindow`] if `end` precedes `start`
    /// or the window cannot be shifted back one year.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if end < start || shift_back_one_year(start).is_none() {
            return Err(AnalyticsError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Calendar year of the window's first day.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Inclusive day count (365 or 366 for calendar years).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn days_in_window(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    /// Returns `true` if `date` lies within the window (inclusive).
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Same window one year earlier. Feb 29 maps to Feb 28.
    #[must_use]
    pub fn preceding_year(&self) -> Self {
        // Both constructors check that start can be shifted; the end is
        // always later so it can be too.
        let start = shift_back_one_year(self.start).unwrap_or(self.start);
        let end = shift_back_one_year(self.end).unwrap_or(self.end);
        Self { start, end }
    }
}

impl std::fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn shift_back_one_year(date: NaiveDate) -> Option<NaiveDate> {
    let year = date.year().checked_sub(1)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
}
