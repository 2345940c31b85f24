// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report assembly: groups aggregation results per user and adds rollups.
//!
//! Text rendering belongs to the presentation layer; this only fixes the
//! fields and their order.

use crate::error::Result;
use crate::models::{
    ActivityTotals, AggregationResult, GetReport, Report, TimeRange, TimeWindow, UserReport,
};
use crate::services::AggregationEngine;
use chrono::{DateTime, Utc};

/// Build a report from results already ordered by (user, activity).
pub fn build_report(
    context_id: i64,
    window: TimeWindow,
    range: TimeRange,
    results: Vec<AggregationResult>,
) -> Report {
    let mut totals = ActivityTotals::default();
    let mut users: Vec<UserReport> = Vec::new();

    for result in results {
        totals.add(&result);

        match users.last_mut() {
            Some(user) if user.user_display_name == result.user_display_name => {
                user.totals.add(&result);
                user.activities.push(result);
            }
            _ => {
                let mut user_totals = ActivityTotals::default();
                user_totals.add(&result);
                users.push(UserReport {
                    user_display_name: result.user_display_name.clone(),
                    totals: user_totals,
                    activities: vec![result],
                });
            }
        }
    }

    Report {
        context_id,
        window,
        range_start: range.start,
        range_end: range.end,
        totals,
        users,
    }
}

/// Serves `GetReport` requests.
#[derive(Clone)]
pub struct ReportService {
    engine: AggregationEngine,
}

impl ReportService {
    pub fn new(engine: AggregationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub async fn report(&self, request: &GetReport, now: DateTime<Utc>) -> Result<Report> {
        let range = self.engine.resolve(request.window, now);
        let results = self
            .engine
            .aggregate_range(request.context_id, range)
            .await?;

        tracing::info!(
            context_id = request.context_id,
            window = %request.window,
            groups = results.len(),
            "Report generated"
        );

        Ok(build_report(request.context_id, request.window, range, results))
    }
}
