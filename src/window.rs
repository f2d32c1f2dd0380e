use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

/// How far the rolling budget windows reach from "today".
const ROLLING_WINDOW_DAYS: i64 = 75;

/// A closed calendar-date interval. Dates only, never instants, so window
/// comparisons cannot drift across a timezone or midnight boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Error)]
#[error("invalid date window: start {start} is after end {end}")]
pub struct InvalidWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Superseded budget policy: `[today, today + 75d]`. Kept selectable via
/// configuration for parity with earlier runs.
pub fn forward(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: today,
        end: today + Duration::days(ROLLING_WINDOW_DAYS),
    }
}

/// Current budget policy: `[today - 75d, today + 75d]`.
pub fn centered(today: NaiveDate) -> DateWindow {
    DateWindow {
        start: today - Duration::days(ROLLING_WINDOW_DAYS),
        end: today + Duration::days(ROLLING_WINDOW_DAYS),
    }
}

/// The most recent complete ISO week: Monday through Sunday of the week
/// before the one containing `today`.
pub fn previous_iso_week(today: NaiveDate) -> DateWindow {
    let this_monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let prev_monday = this_monday - Duration::days(7);
    DateWindow {
        start: prev_monday,
        end: prev_monday + Duration::days(6),
    }
}

/// Which rolling-window policy the budget dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    Forward,
    Centered,
}

impl WindowPolicy {
    pub fn window(self, today: NaiveDate) -> DateWindow {
        match self {
            WindowPolicy::Forward => forward(today),
            WindowPolicy::Centered => centered(today),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown window policy {0:?} (expected \"centered\" or \"forward\")")]
pub struct UnknownPolicy(String);

impl FromStr for WindowPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(WindowPolicy::Forward),
            "centered" => Ok(WindowPolicy::Centered),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}
