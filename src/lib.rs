// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity Tracker: timed activities per user within group contexts
//!
//! This crate provides the tracking engine (one running activity per user
//! and context, with duration and overtime on stop) and calendar-window
//! reports over the completed-activity history.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SharedStore;
use services::{ActivityCatalog, ActivityTracker, AggregationEngine, ReportService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tracker: ActivityTracker,
    pub reports: ReportService,
}

impl AppState {
    /// Wire services around one store and catalog.
    pub fn new(config: Config, store: SharedStore, catalog: ActivityCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let tracker = ActivityTracker::new(store.clone(), catalog.clone());
        let engine = AggregationEngine::new(store, catalog, config.timezone);

        Self {
            config,
            tracker,
            reports: ReportService::new(engine),
        }
    }
}
