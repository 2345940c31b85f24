//! Aggregated report shapes consumed by the presentation layer.
//!
//! Nothing here is persisted; reports are recomputed from the history log
//! on every request.

use crate::models::window::TimeWindow;
use crate::time_utils::rfc3339_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-(user, activity) aggregate within one context and window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub user_display_name: String,
    pub activity_id: String,
    pub occurrence_count: u64,
    pub total_duration_seconds: u64,
    pub total_overtime_seconds: u64,
    /// Records whose duration exceeded the current expected duration
    pub overtime_occurrence_count: u64,
}

/// Summed counters, used for per-user and per-context rollups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTotals {
    pub occurrence_count: u64,
    pub total_duration_seconds: u64,
    pub total_overtime_seconds: u64,
    pub overtime_occurrence_count: u64,
}

impl ActivityTotals {
    pub fn add(&mut self, result: &AggregationResult) {
        self.occurrence_count += result.occurrence_count;
        self.total_duration_seconds += result.total_duration_seconds;
        self.total_overtime_seconds += result.total_overtime_seconds;
        self.overtime_occurrence_count += result.overtime_occurrence_count;
    }
}

/// One user's section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReport {
    pub user_display_name: String,
    pub totals: ActivityTotals,
    /// Ordered by activity ID
    pub activities: Vec<AggregationResult>,
}

/// Complete report for a context and window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub context_id: i64,
    pub window: TimeWindow,
    #[serde(with = "rfc3339_seconds")]
    pub range_start: DateTime<Utc>,
    #[serde(with = "rfc3339_seconds")]
    pub range_end: DateTime<Utc>,
    pub totals: ActivityTotals,
    /// Ordered by display name
    pub users: Vec<UserReport>,
}
