// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod command;
pub mod report;
pub mod window;

pub use activity::{ActivityStatus, CompletedActivity, CompletedActivitySummary, OngoingActivity};
pub use command::{GetReport, StartActivity, StopActivity};
pub use report::{ActivityTotals, AggregationResult, Report, UserReport};
pub use window::{TimeRange, TimeWindow};
