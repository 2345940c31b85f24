// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbound requests accepted by the tracking engine.

use crate::models::window::TimeWindow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartActivity {
    pub user_id: i64,
    pub context_id: i64,
    pub activity_id: String,
    pub user_display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopActivity {
    pub user_id: i64,
    pub context_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetReport {
    pub context_id: i64,
    pub window: TimeWindow,
}
