// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Tracker API Server
//!
//! Tracks timed activities per user within group contexts and serves
//! calendar-window reports over the completed-activity history.

use activity_tracker::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryStore, SharedStore},
    services::ActivityCatalog,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        timezone = %config.timezone,
        "Starting Activity Tracker API"
    );

    let store: SharedStore = match config.storage {
        StorageBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        ),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; state will not survive restart");
            Arc::new(MemoryStore::new())
        }
    };

    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading activity catalog");
            ActivityCatalog::load_from_file(path).expect("Failed to load activity catalog")
        }
        None => ActivityCatalog::builtin(),
    };
    tracing::info!(count = catalog.len(), "Activity catalog loaded");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, catalog));

    // Repair stops interrupted between the history write and the ongoing delete
    let repaired = state
        .tracker
        .reconcile()
        .await
        .expect("Failed to reconcile ongoing activities");
    tracing::info!(repaired, "Startup reconciliation complete");

    // Build router
    let app = activity_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("activity_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
