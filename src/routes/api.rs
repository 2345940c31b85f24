// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API consumed by the chat dispatcher and the report frontend.

use crate::error::{AppError, Result};
use crate::models::{
    ActivityStatus, CompletedActivity, CompletedActivitySummary, GetReport, OngoingActivity,
    Report, StartActivity, StopActivity, TimeWindow,
};
use crate::services::catalog::{ActivityDefinition, DEFAULT_EXPECTED_DURATION_SECS};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes. The dispatcher in front of this service is trusted; there is
/// no per-user authentication here.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(get_catalog))
        .route(
            "/api/contexts/{context_id}/activities/start",
            post(start_activity),
        )
        .route(
            "/api/contexts/{context_id}/activities/stop",
            post(stop_activity),
        )
        .route(
            "/api/contexts/{context_id}/users/{user_id}/status",
            get(get_status),
        )
        .route("/api/contexts/{context_id}/ongoing", get(get_live_status))
        .route("/api/contexts/{context_id}/report", get(get_report))
        .route("/api/contexts/{context_id}/records", get(get_records))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct CatalogResponse {
    /// Applied to activity IDs not listed below
    pub default_expected_duration_seconds: u64,
    pub activities: Vec<ActivityDefinition>,
}

async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        default_expected_duration_seconds: DEFAULT_EXPECTED_DURATION_SECS,
        activities: state.tracker.catalog().definitions(),
    })
}

// ─── Start / Stop ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct StartActivityBody {
    pub user_id: i64,
    #[validate(length(min = 1, max = 64))]
    pub activity_id: String,
    #[validate(length(min = 1, max = 128))]
    pub user_display_name: String,
}

/// Start an activity for a user in a context.
async fn start_activity(
    State(state): State<Arc<AppState>>,
    Path(context_id): Path<i64>,
    Json(mut body): Json<StartActivityBody>,
) -> Result<(StatusCode, Json<OngoingActivity>)> {
    body.activity_id = body.activity_id.trim().to_string();
    body.user_display_name = body.user_display_name.trim().to_string();
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let request = StartActivity {
        user_id: body.user_id,
        context_id,
        activity_id: body.activity_id,
        user_display_name: body.user_display_name,
    };

    let ongoing = state.tracker.start(&request, chrono::Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(ongoing)))
}

#[derive(Deserialize)]
pub struct StopActivityBody {
    pub user_id: i64,
}

/// Stop the user's current activity.
async fn stop_activity(
    State(state): State<Arc<AppState>>,
    Path(context_id): Path<i64>,
    Json(body): Json<StopActivityBody>,
) -> Result<Json<CompletedActivitySummary>> {
    let request = StopActivity {
        user_id: body.user_id,
        context_id,
    };

    let summary = state.tracker.stop(&request, chrono::Utc::now()).await?;
    Ok(Json(summary))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub ongoing: Option<ActivityStatus>,
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Path((context_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<StatusResponse>> {
    let ongoing = state
        .tracker
        .status(user_id, context_id, chrono::Utc::now())
        .await?;
    Ok(Json(StatusResponse { ongoing }))
}

#[derive(Serialize, Deserialize)]
pub struct LiveStatusResponse {
    pub context_id: i64,
    /// Ordered by display name
    pub ongoing: Vec<ActivityStatus>,
}

/// Everyone currently doing something in a context.
async fn get_live_status(
    State(state): State<Arc<AppState>>,
    Path(context_id): Path<i64>,
) -> Result<Json<LiveStatusResponse>> {
    let ongoing = state
        .tracker
        .live_status(context_id, chrono::Utc::now())
        .await?;
    Ok(Json(LiveStatusResponse {
        context_id,
        ongoing,
    }))
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct WindowQuery {
    /// Defaults to `today`
    window: Option<TimeWindow>,
}

/// Aggregated report for a context and window.
async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(context_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Report>> {
    let request = GetReport {
        context_id,
        window: query.window.unwrap_or(TimeWindow::Today),
    };

    let report = state.reports.report(&request, chrono::Utc::now()).await?;
    Ok(Json(report))
}

#[derive(Serialize, Deserialize)]
pub struct RecordsResponse {
    pub context_id: i64,
    pub window: TimeWindow,
    pub records: Vec<CompletedActivity>,
}

/// Raw completed activities for a context and window, oldest first.
async fn get_records(
    State(state): State<Arc<AppState>>,
    Path(context_id): Path<i64>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<RecordsResponse>> {
    let window = query.window.unwrap_or(TimeWindow::Today);
    let records = state
        .reports
        .engine()
        .records(context_id, window, chrono::Utc::now())
        .await?;

    Ok(Json(RecordsResponse {
        context_id,
        window,
        records,
    }))
}
