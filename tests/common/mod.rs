// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_tracker::config::Config;
use activity_tracker::db::{FirestoreDb, MemoryStore, SharedStore};
use activity_tracker::models::{StartActivity, StopActivity};
use activity_tracker::routes::create_router;
use activity_tracker::services::ActivityCatalog;
use activity_tracker::AppState;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create state over a fresh in-memory store with the built-in catalog.
#[allow(dead_code)]
pub fn create_test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
    create_test_state_with(Config::default(), ActivityCatalog::builtin())
}

#[allow(dead_code)]
pub fn create_test_state_with(
    config: Config,
    catalog: ActivityCatalog,
) -> (Arc<AppState>, Arc<MemoryStore>) {
    let memory = Arc::new(MemoryStore::new());
    let store: SharedStore = memory.clone();
    let state = Arc::new(AppState::new(config, store, catalog));
    (state, memory)
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state, and the store for fault injection.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let (state, memory) = create_test_state();
    (create_router(state.clone()), state, memory)
}

#[allow(dead_code)]
pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC3339 timestamp")
        .with_timezone(&Utc)
}

#[allow(dead_code)]
pub fn start_request(user_id: i64, context_id: i64, activity_id: &str, name: &str) -> StartActivity {
    StartActivity {
        user_id,
        context_id,
        activity_id: activity_id.to_string(),
        user_display_name: name.to_string(),
    }
}

#[allow(dead_code)]
pub fn stop_request(user_id: i64, context_id: i64) -> StopActivity {
    StopActivity {
        user_id,
        context_id,
    }
}
