// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`ActivityStore`].
//!
//! Collections:
//! - `ongoing_activities` (one document per user/context, created with
//!   `create` semantics so the key is a true uniqueness constraint)
//! - `completed_activities` (append-only history, keyed by instance ID)
//!
//! Range queries on history filter by `context_id` and order by
//! `started_at`; this requires a composite index on
//! `(context_id ASC, started_at ASC)`.

use crate::db::collections;
use crate::db::{ActivityStore, CompletedStream, StoreError, StoreResult};
use crate::models::{CompletedActivity, OngoingActivity, TimeRange};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use futures_util::StreamExt;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

fn backend(err: FirestoreError) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        // The emulator rejects real credentials; connect unauthenticated.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> StoreResult<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Backend("Database not connected (offline mode)".to_string()))
    }

    /// Classify a failed stop commit: if the ongoing instance is gone, a
    /// concurrent stop (or recovery) already completed it.
    async fn classify_commit_failure(
        &self,
        record: &CompletedActivity,
        err: FirestoreError,
    ) -> StoreError {
        let doc_id = OngoingActivity::document_id(record.user_id, record.context_id);
        let current: Result<Option<OngoingActivity>, StoreError> = match self.get_client() {
            Ok(client) => client
                .fluent()
                .select()
                .by_id_in(collections::ONGOING_ACTIVITIES)
                .obj()
                .one(&doc_id)
                .await
                .map_err(backend),
            Err(e) => Err(e),
        };

        match current {
            Ok(Some(ongoing)) if ongoing.instance_id == record.id => {
                StoreError::Backend(format!("Transaction commit failed: {}", err))
            }
            Ok(_) => StoreError::NotFound,
            Err(_) => StoreError::Backend(format!("Transaction commit failed: {}", err)),
        }
    }
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn get_ongoing(
        &self,
        user_id: i64,
        context_id: i64,
    ) -> StoreResult<Option<OngoingActivity>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ONGOING_ACTIVITIES)
            .obj()
            .one(&OngoingActivity::document_id(user_id, context_id))
            .await
            .map_err(backend)
    }

    async fn insert_ongoing(&self, activity: &OngoingActivity) -> StoreResult<()> {
        // `insert` issues a Firestore create, which fails with ALREADY_EXISTS
        // when the document is present.
        let result: firestore::FirestoreResult<OngoingActivity> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ONGOING_ACTIVITIES)
            .document_id(OngoingActivity::document_id(
                activity.user_id,
                activity.context_id,
            ))
            .object(activity)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(StoreError::Conflict),
            Err(e) => Err(backend(e)),
        }
    }

    async fn delete_ongoing(&self, user_id: i64, context_id: i64) -> StoreResult<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ONGOING_ACTIVITIES)
            .document_id(OngoingActivity::document_id(user_id, context_id))
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn append_completed(&self, record: &CompletedActivity) -> StoreResult<()> {
        let result: firestore::FirestoreResult<CompletedActivity> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::COMPLETED_ACTIVITIES)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(StoreError::Conflict),
            Err(e) => Err(backend(e)),
        }
    }

    /// Both writes go in one transaction:
    /// 1. create `completed_activities/{id}` (must not exist)
    /// 2. delete `ongoing_activities/{user}_{context}` (must exist)
    ///
    /// A second stop for the same instance fails precondition 1, so history
    /// gets exactly one record per instance.
    async fn complete_ongoing(&self, record: &CompletedActivity) -> StoreResult<()> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::COMPLETED_ACTIVITIES)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&record.id)
            .object(record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                StoreError::Backend(format!("Failed to add history record to transaction: {}", e))
            })?;

        client
            .fluent()
            .delete()
            .from(collections::ONGOING_ACTIVITIES)
            .document_id(OngoingActivity::document_id(
                record.user_id,
                record.context_id,
            ))
            .precondition(FirestoreWritePrecondition::Exists(true))
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                StoreError::Backend(format!("Failed to add ongoing delete to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            return Err(self.classify_commit_failure(record, e).await);
        }

        tracing::debug!(
            record_id = %record.id,
            user_id = record.user_id,
            context_id = record.context_id,
            "Activity completed atomically"
        );

        Ok(())
    }

    async fn query_completed<'a>(
        &'a self,
        context_id: i64,
        range: TimeRange,
    ) -> StoreResult<CompletedStream<'a>> {
        let start = format_utc_rfc3339(range.start);
        let end = format_utc_rfc3339(range.end);

        let stream = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMPLETED_ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("context_id").eq(context_id),
                    q.field("started_at").greater_than_or_equal(start.clone()),
                    q.field("started_at").less_than(end.clone()),
                ])
            })
            .order_by([("started_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj::<CompletedActivity>()
            .stream_query_with_errors()
            .await
            .map_err(backend)?;

        Ok(stream.map(|item| item.map_err(backend)).boxed())
    }

    async fn list_ongoing(&self) -> StoreResult<Vec<OngoingActivity>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ONGOING_ACTIVITIES)
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn list_ongoing_in_context(
        &self,
        context_id: i64,
    ) -> StoreResult<Vec<OngoingActivity>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ONGOING_ACTIVITIES)
            .filter(|q| q.for_all([q.field("context_id").eq(context_id)]))
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn has_completed(&self, record_id: &str) -> StoreResult<bool> {
        let record: Option<CompletedActivity> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMPLETED_ACTIVITIES)
            .obj()
            .one(record_id)
            .await
            .map_err(backend)?;
        Ok(record.is_some())
    }
}
