// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregation;
pub mod catalog;
pub mod report;
pub mod tracker;

pub use aggregation::{aggregate_records, AggregationEngine, Aggregator};
pub use catalog::{ActivityCatalog, ActivityDefinition, CatalogError};
pub use report::{build_report, ReportService};
pub use tracker::ActivityTracker;
