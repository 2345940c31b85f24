// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-windowed aggregation over the completed-activity log.
//!
//! Total overtime sums the `overtime_seconds` stored with each record at stop
//! time. The overtime occurrence count is re-evaluated against the catalog in
//! force when the report is computed, so editing an expected duration changes
//! past counts as well.

use crate::db::SharedStore;
use crate::error::Result;
use crate::models::{AggregationResult, CompletedActivity, TimeRange, TimeWindow};
use crate::services::ActivityCatalog;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures_util::{StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Running fold keyed by (display name, activity ID).
///
/// The BTreeMap key order is the output order.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: BTreeMap<(String, String), AggregationResult>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &CompletedActivity, catalog: &ActivityCatalog) {
        let expected = catalog.expected_duration(&record.activity_id);

        let entry = self
            .groups
            .entry((
                record.user_display_name.clone(),
                record.activity_id.clone(),
            ))
            .or_insert_with(|| AggregationResult {
                user_display_name: record.user_display_name.clone(),
                activity_id: record.activity_id.clone(),
                occurrence_count: 0,
                total_duration_seconds: 0,
                total_overtime_seconds: 0,
                overtime_occurrence_count: 0,
            });

        entry.occurrence_count += 1;
        entry.total_duration_seconds += record.duration_seconds;
        entry.total_overtime_seconds += record.overtime_seconds;
        if record.duration_seconds > expected {
            entry.overtime_occurrence_count += 1;
        }
    }

    /// Results ordered by (display name, activity ID).
    pub fn finish(self) -> Vec<AggregationResult> {
        self.groups.into_values().collect()
    }
}

/// Aggregate an in-memory slice of records.
pub fn aggregate_records<'a, I>(records: I, catalog: &ActivityCatalog) -> Vec<AggregationResult>
where
    I: IntoIterator<Item = &'a CompletedActivity>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.push(record, catalog);
    }
    aggregator.finish()
}

/// Read-only aggregation engine.
#[derive(Clone)]
pub struct AggregationEngine {
    store: SharedStore,
    catalog: Arc<ActivityCatalog>,
    timezone: Tz,
}

impl AggregationEngine {
    pub fn new(store: SharedStore, catalog: Arc<ActivityCatalog>, timezone: Tz) -> Self {
        Self {
            store,
            catalog,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve a window against the configured civil calendar at `now`.
    pub fn resolve(&self, window: TimeWindow, now: DateTime<Utc>) -> TimeRange {
        window.resolve(&now.with_timezone(&self.timezone))
    }

    /// Aggregate a context's history within a window.
    ///
    /// Returns an empty vec when nothing matches; storage errors propagate.
    pub async fn aggregate(
        &self,
        context_id: i64,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<AggregationResult>> {
        self.aggregate_range(context_id, self.resolve(window, now))
            .await
    }

    pub async fn aggregate_range(
        &self,
        context_id: i64,
        range: TimeRange,
    ) -> Result<Vec<AggregationResult>> {
        let mut records = self.store.query_completed(context_id, range).await?;
        let mut aggregator = Aggregator::new();
        let mut scanned = 0usize;

        while let Some(record) = records.next().await {
            aggregator.push(&record?, &self.catalog);
            scanned += 1;
        }

        let results = aggregator.finish();
        tracing::debug!(
            context_id,
            scanned,
            groups = results.len(),
            "Aggregated activity history"
        );
        Ok(results)
    }

    /// Raw history records in a window, oldest first.
    pub async fn records(
        &self,
        context_id: i64,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<CompletedActivity>> {
        let range = self.resolve(window, now);
        let records: Vec<CompletedActivity> = self
            .store
            .query_completed(context_id, range)
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }
}
