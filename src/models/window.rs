// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar-relative reporting windows.

use crate::time_utils::start_of_local_day;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerated reporting window, resolved against the local civil calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

/// Half-open UTC range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::Today,
        TimeWindow::Yesterday,
        TimeWindow::ThisWeek,
        TimeWindow::LastWeek,
        TimeWindow::ThisMonth,
        TimeWindow::LastMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::Yesterday => "yesterday",
            TimeWindow::ThisWeek => "this_week",
            TimeWindow::LastWeek => "last_week",
            TimeWindow::ThisMonth => "this_month",
            TimeWindow::LastMonth => "last_month",
        }
    }

    /// Resolve to a concrete UTC range using the calendar of `now`'s zone.
    ///
    /// Weeks start on Monday (ISO 8601). Every range starts at a local
    /// midnight and ends at the local midnight following the last day.
    pub fn resolve<Z: TimeZone>(&self, now: &DateTime<Z>) -> TimeRange {
        let tz = now.timezone();
        let today = now.date_naive();
        let (first_day, end_day) = self.day_bounds(today);

        TimeRange {
            start: start_of_local_day(&tz, first_day),
            end: start_of_local_day(&tz, end_day),
        }
    }

    /// First day of the window and the day after its last day.
    fn day_bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let month_start = today.with_day(1).unwrap_or(today);

        match self {
            TimeWindow::Today => (today, today + Days::new(1)),
            TimeWindow::Yesterday => (today - Days::new(1), today),
            TimeWindow::ThisWeek => (monday, monday + Days::new(7)),
            TimeWindow::LastWeek => (monday - Days::new(7), monday),
            TimeWindow::ThisMonth => (month_start, month_start + Months::new(1)),
            TimeWindow::LastMonth => (month_start - Months::new(1), month_start),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown time window: {0}")]
pub struct UnknownTimeWindow(pub String);

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeWindow::ALL
            .into_iter()
            .find(|window| window.as_str() == s)
            .ok_or_else(|| UnknownTimeWindow(s.to_string()))
    }
}
