// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ongoing and completed activity records.

use crate::time_utils::{elapsed_seconds, rfc3339_seconds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-progress activity, at most one per (user, context).
///
/// Stored at: `ongoing_activities/{user_id}_{context_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OngoingActivity {
    /// Unique per start; becomes the id of the completed record
    pub instance_id: String,
    pub user_id: i64,
    /// Group chat / channel the activity belongs to
    pub context_id: i64,
    pub activity_id: String,
    /// Start time, whole seconds
    #[serde(with = "rfc3339_seconds")]
    pub started_at: DateTime<Utc>,
    pub user_display_name: String,
}

impl OngoingActivity {
    /// Document ID for the (user, context) key.
    pub fn document_id(user_id: i64, context_id: i64) -> String {
        format!("{}_{}", user_id, context_id)
    }

    pub fn key(&self) -> (i64, i64) {
        (self.user_id, self.context_id)
    }

    /// Build the history record for stopping this activity at `ended_at`.
    ///
    /// Duration is clamped at zero on clock skew; overtime never exceeds it.
    pub fn complete(
        &self,
        ended_at: DateTime<Utc>,
        expected_duration_seconds: u64,
    ) -> CompletedActivity {
        let duration_seconds = elapsed_seconds(self.started_at, ended_at);

        CompletedActivity {
            id: self.instance_id.clone(),
            user_id: self.user_id,
            context_id: self.context_id,
            activity_id: self.activity_id.clone(),
            started_at: self.started_at,
            ended_at,
            duration_seconds,
            overtime_seconds: overtime_seconds(duration_seconds, expected_duration_seconds),
            user_display_name: self.user_display_name.clone(),
            recorded_at: ended_at,
        }
    }
}

/// Historical activity record. Append-only.
///
/// Stored at: `completed_activities/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedActivity {
    /// Instance ID of the ongoing activity this record completed
    pub id: String,
    pub user_id: i64,
    pub context_id: i64,
    pub activity_id: String,
    #[serde(with = "rfc3339_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "rfc3339_seconds")]
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    /// Overtime against the catalog in force when the activity stopped
    pub overtime_seconds: u64,
    pub user_display_name: String,
    #[serde(with = "rfc3339_seconds")]
    pub recorded_at: DateTime<Utc>,
}

/// Result of a successful stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedActivitySummary {
    pub activity_id: String,
    pub duration_seconds: u64,
    pub overtime_seconds: u64,
    pub user_display_name: String,
    #[serde(with = "rfc3339_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "rfc3339_seconds")]
    pub ended_at: DateTime<Utc>,
}

impl From<&CompletedActivity> for CompletedActivitySummary {
    fn from(record: &CompletedActivity) -> Self {
        Self {
            activity_id: record.activity_id.clone(),
            duration_seconds: record.duration_seconds,
            overtime_seconds: record.overtime_seconds,
            user_display_name: record.user_display_name.clone(),
            started_at: record.started_at,
            ended_at: record.ended_at,
        }
    }
}

/// Live view of an ongoing activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatus {
    pub user_id: i64,
    pub activity_id: String,
    #[serde(with = "rfc3339_seconds")]
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub expected_duration_seconds: u64,
    /// Overtime accrued so far
    pub overtime_seconds: u64,
    pub user_display_name: String,
}

/// Positive excess of `duration` over `expected`, zero otherwise.
pub fn overtime_seconds(duration_seconds: u64, expected_duration_seconds: u64) -> u64 {
    duration_seconds.saturating_sub(expected_duration_seconds)
}
