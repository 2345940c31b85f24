//! Database layer.
//!
//! [`ActivityStore`] is the only path to durable state. Two implementations:
//! [`FirestoreDb`] for deployments and [`MemoryStore`] for tests and local
//! development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::models::{CompletedActivity, OngoingActivity, TimeRange};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    /// In-progress activities, keyed by `{user_id}_{context_id}`
    pub const ONGOING_ACTIVITIES: &str = "ongoing_activities";
    /// Append-only history, keyed by instance ID
    pub const COMPLETED_ACTIVITIES: &str = "completed_activities";
}

/// Storage adapter errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniquely keyed row already exists.
    #[error("Record already exists")]
    Conflict,

    /// The row an operation depends on is gone.
    #[error("Record not found")]
    NotFound,

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lazy sequence of history records.
pub type CompletedStream<'a> = BoxStream<'a, StoreResult<CompletedActivity>>;

/// Shared handle passed to every service.
pub type SharedStore = Arc<dyn ActivityStore>;

/// Durable storage for ongoing activities and the completed-activity log.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn get_ongoing(&self, user_id: i64, context_id: i64)
        -> StoreResult<Option<OngoingActivity>>;

    /// Insert-if-absent. Returns [`StoreError::Conflict`] if the
    /// (user, context) key is taken; the check is atomic in the backend.
    async fn insert_ongoing(&self, activity: &OngoingActivity) -> StoreResult<()>;

    /// Delete the ongoing row for a key. No-op if absent.
    async fn delete_ongoing(&self, user_id: i64, context_id: i64) -> StoreResult<()>;

    /// Append a record to history. Returns [`StoreError::Conflict`] if a
    /// record with the same ID exists.
    async fn append_completed(&self, record: &CompletedActivity) -> StoreResult<()>;

    /// Atomically append `record` and delete the ongoing row it completes.
    ///
    /// Returns [`StoreError::NotFound`] if that ongoing instance is no
    /// longer present (e.g. a concurrent stop won).
    async fn complete_ongoing(&self, record: &CompletedActivity) -> StoreResult<()>;

    /// Stream history records for a context with `started_at` in `range`,
    /// ordered by `started_at`. Each call opens a fresh read.
    async fn query_completed<'a>(
        &'a self,
        context_id: i64,
        range: TimeRange,
    ) -> StoreResult<CompletedStream<'a>>;

    async fn list_ongoing(&self) -> StoreResult<Vec<OngoingActivity>>;

    /// All ongoing rows for one context, in no particular order.
    async fn list_ongoing_in_context(&self, context_id: i64)
        -> StoreResult<Vec<OngoingActivity>>;

    async fn has_completed(&self, record_id: &str) -> StoreResult<bool>;
}
