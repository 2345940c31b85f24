// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity state machine.
//!
//! Each (user, context) pair is either idle (no ongoing row) or has exactly
//! one activity in progress:
//! 1. `start` moves idle -> in progress (insert-if-absent in the store)
//! 2. `stop` moves in progress -> idle, appending one history record
//!
//! The store's uniqueness constraint on the ongoing key is the only
//! serialization point; concurrent requests for other keys never wait on
//! each other.

use crate::db::{SharedStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::activity::overtime_seconds;
use crate::models::{
    ActivityStatus, CompletedActivitySummary, OngoingActivity, StartActivity, StopActivity,
};
use crate::services::ActivityCatalog;
use crate::time_utils::{elapsed_seconds, whole_seconds};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Insert attempts per start when a conflicting activity vanishes mid-race.
const START_ATTEMPTS: u32 = 2;

/// Stateless request handler over the store.
#[derive(Clone)]
pub struct ActivityTracker {
    store: SharedStore,
    catalog: Arc<ActivityCatalog>,
}

impl ActivityTracker {
    pub fn new(store: SharedStore, catalog: Arc<ActivityCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &ActivityCatalog {
        &self.catalog
    }

    /// Start an activity.
    ///
    /// Fails with `ActivityAlreadyInProgress` if the user already has one
    /// running in this context, including when a concurrent start won the
    /// insert race. The existing activity is never overwritten. If the
    /// conflicting activity is gone by the time it is read back, the insert
    /// is retried.
    pub async fn start(
        &self,
        request: &StartActivity,
        now: DateTime<Utc>,
    ) -> Result<OngoingActivity> {
        if let Some(current) = self
            .store
            .get_ongoing(request.user_id, request.context_id)
            .await?
        {
            return Err(AppError::ActivityAlreadyInProgress {
                activity_id: current.activity_id,
            });
        }

        let ongoing = OngoingActivity {
            instance_id: uuid::Uuid::new_v4().to_string(),
            user_id: request.user_id,
            context_id: request.context_id,
            activity_id: request.activity_id.clone(),
            started_at: whole_seconds(now),
            user_display_name: request.user_display_name.clone(),
        };

        for attempt in 1..=START_ATTEMPTS {
            match self.store.insert_ongoing(&ongoing).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = ongoing.user_id,
                        context_id = ongoing.context_id,
                        activity_id = %ongoing.activity_id,
                        instance_id = %ongoing.instance_id,
                        "Activity started"
                    );
                    return Ok(ongoing);
                }
                Err(StoreError::Conflict) => {
                    if let Some(current) = self
                        .store
                        .get_ongoing(request.user_id, request.context_id)
                        .await?
                    {
                        tracing::debug!(
                            user_id = request.user_id,
                            context_id = request.context_id,
                            activity_id = %current.activity_id,
                            "Lost start race"
                        );
                        return Err(AppError::ActivityAlreadyInProgress {
                            activity_id: current.activity_id,
                        });
                    }

                    // The winner stopped before we could read it back.
                    tracing::debug!(
                        user_id = request.user_id,
                        context_id = request.context_id,
                        attempt,
                        "Conflicting activity already stopped, retrying start"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "start for user {} in context {} conflicted {} times with no ongoing activity",
            request.user_id,
            request.context_id,
            START_ATTEMPTS
        )))
    }

    /// Stop the user's current activity and record it in history.
    ///
    /// Duration is clamped at zero on clock skew. Overtime uses the catalog
    /// entry for the activity at stop time. A second stop fails with
    /// `NoActivityInProgress`.
    pub async fn stop(
        &self,
        request: &StopActivity,
        now: DateTime<Utc>,
    ) -> Result<CompletedActivitySummary> {
        let ongoing = self
            .store
            .get_ongoing(request.user_id, request.context_id)
            .await?
            .ok_or(AppError::NoActivityInProgress)?;

        let expected = self.catalog.expected_duration(&ongoing.activity_id);
        let record = ongoing.complete(whole_seconds(now), expected);

        match self.store.complete_ongoing(&record).await {
            Ok(()) => {}
            // A concurrent stop completed this instance first
            Err(StoreError::NotFound) | Err(StoreError::Conflict) => {
                return Err(AppError::NoActivityInProgress)
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            user_id = record.user_id,
            context_id = record.context_id,
            activity_id = %record.activity_id,
            duration_seconds = record.duration_seconds,
            overtime_seconds = record.overtime_seconds,
            "Activity stopped"
        );

        Ok(CompletedActivitySummary::from(&record))
    }

    /// Current activity for a user, with elapsed time and overtime so far.
    pub async fn status(
        &self,
        user_id: i64,
        context_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ActivityStatus>> {
        let ongoing = self.store.get_ongoing(user_id, context_id).await?;
        Ok(ongoing.map(|ongoing| self.status_of(ongoing, now)))
    }

    /// Everything in progress in a context, ordered by display name.
    pub async fn live_status(
        &self,
        context_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActivityStatus>> {
        let mut statuses: Vec<ActivityStatus> = self
            .store
            .list_ongoing_in_context(context_id)
            .await?
            .into_iter()
            .map(|ongoing| self.status_of(ongoing, now))
            .collect();

        statuses.sort_by(|a, b| {
            a.user_display_name
                .cmp(&b.user_display_name)
                .then(a.user_id.cmp(&b.user_id))
        });

        tracing::debug!(context_id, ongoing = statuses.len(), "Live status read");
        Ok(statuses)
    }

    fn status_of(&self, ongoing: OngoingActivity, now: DateTime<Utc>) -> ActivityStatus {
        let expected = self.catalog.expected_duration(&ongoing.activity_id);
        let elapsed = elapsed_seconds(ongoing.started_at, now);

        ActivityStatus {
            user_id: ongoing.user_id,
            activity_id: ongoing.activity_id,
            started_at: ongoing.started_at,
            elapsed_seconds: elapsed,
            expected_duration_seconds: expected,
            overtime_seconds: overtime_seconds(elapsed, expected),
            user_display_name: ongoing.user_display_name,
        }
    }

    /// Delete ongoing rows whose history record already exists.
    ///
    /// Repairs a stop that committed its history write but not the ongoing
    /// delete. Idempotent; returns the number of rows removed.
    pub async fn reconcile(&self) -> Result<usize> {
        let mut repaired = 0;

        for ongoing in self.store.list_ongoing().await? {
            if !self.store.has_completed(&ongoing.instance_id).await? {
                continue;
            }

            // Re-check: the key may have been stopped and restarted meanwhile.
            let still_current = self
                .store
                .get_ongoing(ongoing.user_id, ongoing.context_id)
                .await?
                .is_some_and(|current| current.instance_id == ongoing.instance_id);
            if !still_current {
                continue;
            }

            tracing::warn!(
                user_id = ongoing.user_id,
                context_id = ongoing.context_id,
                instance_id = %ongoing.instance_id,
                "Removing ongoing activity already recorded in history"
            );
            self.store
                .delete_ongoing(ongoing.user_id, ongoing.context_id)
                .await?;
            repaired += 1;
        }

        if repaired > 0 {
            tracing::info!(repaired, "Reconciled ongoing activities");
        }

        Ok(repaired)
    }
}
