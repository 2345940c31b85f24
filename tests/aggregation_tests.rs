// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregation and report tests over recorded history.

use activity_tracker::config::Config;
use activity_tracker::db::ActivityStore;
use activity_tracker::models::{CompletedActivity, GetReport, TimeWindow};
use activity_tracker::services::{ActivityCatalog, ActivityDefinition};
use chrono::{DateTime, Duration, Utc};

mod common;
use common::{create_test_state, create_test_state_with, parse_time};

const CONTEXT: i64 = 42;

fn record(
    id: &str,
    context_id: i64,
    name: &str,
    activity: &str,
    started_at: DateTime<Utc>,
    duration: u64,
) -> CompletedActivity {
    let ended_at = started_at + Duration::seconds(duration as i64);
    CompletedActivity {
        id: id.to_string(),
        user_id: name.len() as i64,
        context_id,
        activity_id: activity.to_string(),
        started_at,
        ended_at,
        duration_seconds: duration,
        overtime_seconds: duration
            .saturating_sub(ActivityCatalog::builtin().expected_duration(activity)),
        user_display_name: name.to_string(),
        recorded_at: ended_at,
    }
}

fn catalog_a_300() -> ActivityCatalog {
    ActivityCatalog::from_definitions([ActivityDefinition {
        id: "A".to_string(),
        expected_duration_seconds: 300,
    }])
    .unwrap()
}

#[tokio::test]
async fn test_today_counts_durations_and_overtime() {
    let (state, store) = create_test_state_with(Config::default(), catalog_a_300());
    let now = parse_time("2024-01-15T18:00:00Z");

    for (i, duration) in [100, 500, 200].into_iter().enumerate() {
        let started = parse_time("2024-01-15T09:00:00Z") + Duration::hours(i as i64);
        store
            .append_completed(&record(&format!("r{}", i), CONTEXT, "Alice", "A", started, duration))
            .await
            .unwrap();
    }

    let results = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::Today, now)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let alice = &results[0];
    assert_eq!(alice.user_display_name, "Alice");
    assert_eq!(alice.activity_id, "A");
    assert_eq!(alice.occurrence_count, 3);
    assert_eq!(alice.total_duration_seconds, 800);
    assert_eq!(alice.total_overtime_seconds, 200);
    assert_eq!(alice.overtime_occurrence_count, 1);

    // Idempotent
    let again = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::Today, now)
        .await
        .unwrap();
    assert_eq!(results, again);
}

#[tokio::test]
async fn test_overtime_total_survives_catalog_change() {
    // Recorded while A allowed 300s; the catalog now allows 600s
    let catalog = ActivityCatalog::from_definitions([ActivityDefinition {
        id: "A".to_string(),
        expected_duration_seconds: 600,
    }])
    .unwrap();
    let (state, store) = create_test_state_with(Config::default(), catalog);

    let mut stored = record(
        "r1",
        CONTEXT,
        "Alice",
        "A",
        parse_time("2024-01-15T09:00:00Z"),
        500,
    );
    stored.overtime_seconds = 200;
    store.append_completed(&stored).await.unwrap();

    let results = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::Today, parse_time("2024-01-15T18:00:00Z"))
        .await
        .unwrap();

    assert_eq!(results[0].total_overtime_seconds, 200);
    assert_eq!(results[0].overtime_occurrence_count, 0);
}

#[tokio::test]
async fn test_empty_window_is_not_an_error() {
    let (state, _store) = create_test_state();

    let results = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::LastMonth, parse_time("2024-01-15T18:00:00Z"))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_contexts_are_isolated() {
    let (state, store) = create_test_state();
    let started = parse_time("2024-01-15T09:00:00Z");

    store
        .append_completed(&record("mine", CONTEXT, "Alice", "phone", started, 60))
        .await
        .unwrap();
    store
        .append_completed(&record("theirs", CONTEXT + 1, "Bob", "phone", started, 60))
        .await
        .unwrap();

    let results = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::Today, parse_time("2024-01-15T18:00:00Z"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].user_display_name, "Alice");
}

#[tokio::test]
async fn test_window_boundaries_are_half_open() {
    let (state, store) = create_test_state();
    let now = parse_time("2024-01-15T18:00:00Z");

    let cases = [
        ("yesterday-last-second", "2024-01-14T23:59:59Z"),
        ("today-first-second", "2024-01-15T00:00:00Z"),
        ("tomorrow-first-second", "2024-01-16T00:00:00Z"),
    ];
    for (id, started) in cases {
        store
            .append_completed(&record(id, CONTEXT, "Alice", "phone", parse_time(started), 60))
            .await
            .unwrap();
    }

    let engine = state.reports.engine();
    let today = engine.records(CONTEXT, TimeWindow::Today, now).await.unwrap();
    let ids: Vec<&str> = today.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["today-first-second"]);

    let yesterday = engine
        .records(CONTEXT, TimeWindow::Yesterday, now)
        .await
        .unwrap();
    assert_eq!(yesterday.len(), 1);
    assert_eq!(yesterday[0].id, "yesterday-last-second");
}

#[tokio::test]
async fn test_windows_follow_configured_timezone() {
    let config = Config {
        timezone: chrono_tz::Asia::Taipei,
        ..Config::default()
    };
    let (state, store) = create_test_state_with(config, ActivityCatalog::builtin());

    // 2024-01-15 23:30 in Taipei is still the 15th there, already the 16th in UTC
    let now = parse_time("2024-01-15T15:30:00Z");
    // 2024-01-15 07:00 Taipei
    store
        .append_completed(&record(
            "morning",
            CONTEXT,
            "Alice",
            "phone",
            parse_time("2024-01-14T23:00:00Z"),
            60,
        ))
        .await
        .unwrap();

    let today = state
        .reports
        .engine()
        .records(CONTEXT, TimeWindow::Today, now)
        .await
        .unwrap();
    assert_eq!(today.len(), 1);
}

#[tokio::test]
async fn test_records_in_start_order() {
    let (state, store) = create_test_state();
    let now = parse_time("2024-01-15T18:00:00Z");

    for (id, started) in [
        ("late", "2024-01-15T12:00:00Z"),
        ("early", "2024-01-15T08:00:00Z"),
        ("middle", "2024-01-15T10:00:00Z"),
    ] {
        store
            .append_completed(&record(id, CONTEXT, "Alice", "phone", parse_time(started), 60))
            .await
            .unwrap();
    }

    let records = state
        .reports
        .engine()
        .records(CONTEXT, TimeWindow::Today, now)
        .await
        .unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "middle", "late"]);
}

#[tokio::test]
async fn test_report_groups_users_with_rollups() {
    let (state, store) = create_test_state();
    let now = parse_time("2024-01-17T18:00:00Z");
    let monday = parse_time("2024-01-15T09:00:00Z");

    let history = [
        record("1", CONTEXT, "Bob", "smoking", monday, 400),
        record("2", CONTEXT, "Alice", "toilet", monday + Duration::hours(1), 300),
        record("3", CONTEXT, "Alice", "phone", monday + Duration::days(1), 700),
        // Previous week, excluded
        record("4", CONTEXT, "Alice", "phone", monday - Duration::days(1), 700),
    ];
    for r in &history {
        store.append_completed(r).await.unwrap();
    }

    let report = state
        .reports
        .report(
            &GetReport {
                context_id: CONTEXT,
                window: TimeWindow::ThisWeek,
            },
            now,
        )
        .await
        .unwrap();

    assert_eq!(report.range_start, parse_time("2024-01-15T00:00:00Z"));
    assert_eq!(report.range_end, parse_time("2024-01-22T00:00:00Z"));
    assert_eq!(report.users.len(), 2);

    let alice = &report.users[0];
    assert_eq!(alice.user_display_name, "Alice");
    let activities: Vec<&str> = alice.activities.iter().map(|a| a.activity_id.as_str()).collect();
    assert_eq!(activities, vec!["phone", "toilet"]);
    assert_eq!(alice.totals.occurrence_count, 2);
    assert_eq!(alice.totals.total_duration_seconds, 1000);
    assert_eq!(alice.totals.total_overtime_seconds, 100);

    let bob = &report.users[1];
    assert_eq!(bob.user_display_name, "Bob");
    assert_eq!(bob.totals.total_overtime_seconds, 100);

    assert_eq!(report.totals.occurrence_count, 3);
    assert_eq!(report.totals.overtime_occurrence_count, 2);
}

#[tokio::test]
async fn test_storage_failure_propagates_from_aggregate() {
    let (state, store) = create_test_state();
    store.set_unavailable(true);

    let result = state
        .reports
        .engine()
        .aggregate(CONTEXT, TimeWindow::Today, parse_time("2024-01-15T18:00:00Z"))
        .await;
    assert!(matches!(
        result,
        Err(activity_tracker::error::AppError::Storage(_))
    ));
}
