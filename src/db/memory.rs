// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for tests and local development.
//!
//! Not durable: contents are lost when the process exits.

use crate::db::{ActivityStore, CompletedStream, StoreError, StoreResult};
use crate::models::{CompletedActivity, OngoingActivity, TimeRange};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// DashMap-backed store.
///
/// The ongoing map's entry lock is the per-key serialization point; it is
/// held across the history append and the row removal in
/// [`ActivityStore::complete_ongoing`].
#[derive(Default)]
pub struct MemoryStore {
    ongoing: DashMap<(i64, i64), OngoingActivity>,
    completed: RwLock<Vec<CompletedActivity>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a backend error, as an unreachable
    /// database would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of history records, across all contexts.
    pub fn completed_len(&self) -> usize {
        self.completed.read().map(|records| records.len()).unwrap_or(0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Store unavailable".to_string()));
        }
        Ok(())
    }

    fn push_completed(&self, record: &CompletedActivity) -> StoreResult<()> {
        let mut completed = self
            .completed
            .write()
            .map_err(|_| StoreError::Backend("History lock poisoned".to_string()))?;

        if completed.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Conflict);
        }
        completed.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn get_ongoing(
        &self,
        user_id: i64,
        context_id: i64,
    ) -> StoreResult<Option<OngoingActivity>> {
        self.check_available()?;
        Ok(self
            .ongoing
            .get(&(user_id, context_id))
            .map(|entry| entry.value().clone()))
    }

    async fn insert_ongoing(&self, activity: &OngoingActivity) -> StoreResult<()> {
        self.check_available()?;
        match self.ongoing.entry(activity.key()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(entry) => {
                entry.insert(activity.clone());
                Ok(())
            }
        }
    }

    async fn delete_ongoing(&self, user_id: i64, context_id: i64) -> StoreResult<()> {
        self.check_available()?;
        self.ongoing.remove(&(user_id, context_id));
        Ok(())
    }

    async fn append_completed(&self, record: &CompletedActivity) -> StoreResult<()> {
        self.check_available()?;
        self.push_completed(record)
    }

    async fn complete_ongoing(&self, record: &CompletedActivity) -> StoreResult<()> {
        self.check_available()?;
        match self.ongoing.entry((record.user_id, record.context_id)) {
            Entry::Occupied(entry) if entry.get().instance_id == record.id => {
                self.push_completed(record)?;
                entry.remove();
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn query_completed<'a>(
        &'a self,
        context_id: i64,
        range: TimeRange,
    ) -> StoreResult<CompletedStream<'a>> {
        self.check_available()?;
        let mut records: Vec<CompletedActivity> = self
            .completed
            .read()
            .map_err(|_| StoreError::Backend("History lock poisoned".to_string()))?
            .iter()
            .filter(|record| record.context_id == context_id && range.contains(record.started_at))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.started_at);

        Ok(stream::iter(records.into_iter().map(Ok)).boxed())
    }

    async fn list_ongoing(&self) -> StoreResult<Vec<OngoingActivity>> {
        self.check_available()?;
        Ok(self
            .ongoing
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_ongoing_in_context(
        &self,
        context_id: i64,
    ) -> StoreResult<Vec<OngoingActivity>> {
        self.check_available()?;
        Ok(self
            .ongoing
            .iter()
            .filter(|entry| entry.key().1 == context_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn has_completed(&self, record_id: &str) -> StoreResult<bool> {
        self.check_available()?;
        let completed = self
            .completed
            .read()
            .map_err(|_| StoreError::Backend("History lock poisoned".to_string()))?;
        Ok(completed.iter().any(|record| record.id == record_id))
    }
}
