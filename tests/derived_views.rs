//! End-to-end derived-view tests over the standard fixture: seed through
//! the store API, assemble, and assert on each engine's output.

mod common;

use common::{TrackerFixture, date};
use polestar::assemble::assemble;
use polestar::config::TrackerConfig;
use polestar::snapshot::{FetchContext, SnapshotLoader};
use polestar::views::{
    CalendarFilter, DelayStatus, KanbanFilter, calendar_view, gantt_view, kanban_view,
    milestone_texts, task_delays, user_breakdowns, user_performance, workload_view,
};

#[test]
fn calendar_buckets_compose_lane_and_leaf_names() {
    let fixture = TrackerFixture::standard();
    let view = calendar_view(&fixture.groups(), &CalendarFilter::default());

    // OAuth's Dev Complete on 03-06: the leaf entry composes the lane name,
    // and the roll-up copy appears as the plain lane entry the same day.
    let bucket = view.get(&date(2024, 3, 6)).expect("bucket for 03-06");
    let names: Vec<&str> = bucket
        .entries
        .iter()
        .map(|e| e.subtask_name.as_str())
        .collect();
    assert!(names.contains(&"Backend → OAuth"));
    assert!(names.contains(&"Backend"));

    // Every entry carries the lane assignee and the task category.
    for entry in &bucket.entries {
        assert_eq!(entry.engineer_name, "Dana Smith");
        assert_eq!(entry.task_name, "Login");
    }
}

#[test]
fn calendar_closed_filter_commutes_with_engineer_filter() {
    let fixture = TrackerFixture::standard();
    let groups = fixture.groups();

    let riley = fixture.user_id("Riley Chen");
    let combined = calendar_view(
        &groups,
        &CalendarFilter {
            engineer: Some(riley.clone()),
            hide_closed: true,
            ..CalendarFilter::default()
        },
    );

    // Applying the CLOSED filter as a pre-pass over the groups and the
    // engineer filter afterwards must give the same buckets.
    let open_groups: Vec<_> = groups.iter().filter(|g| !g.is_closed()).cloned().collect();
    let sequential = calendar_view(
        &open_groups,
        &CalendarFilter {
            engineer: Some(riley),
            ..CalendarFilter::default()
        },
    );
    assert_eq!(combined, sequential);

    // Billing is closed, so only Riley's UI work on Login survives.
    assert!(combined.contains_key(&date(2024, 2, 28)));
    assert!(!combined.contains_key(&date(2024, 4, 5)));
}

#[test]
fn calendar_task_level_only_keeps_planned_lanes() {
    let fixture = TrackerFixture::standard();
    let view = calendar_view(
        &fixture.groups(),
        &CalendarFilter {
            task_level_only: true,
            ..CalendarFilter::default()
        },
    );
    // Only PLANNED-lane entries remain: Login 03-01/03-20, Billing 04-01.
    let dates: Vec<_> = view.keys().copied().collect();
    assert_eq!(dates, vec![date(2024, 3, 1), date(2024, 3, 20), date(2024, 4, 1)]);
    assert!(view.values().all(|bucket| bucket
        .entries
        .iter()
        .all(|e| e.subtask_name == "PLANNED")));
}

#[test]
fn gantt_progress_means_hold_at_every_level() {
    let fixture = TrackerFixture::standard();
    let chart = gantt_view(&fixture.groups());

    for task in &chart.tasks {
        if task.children.is_empty() {
            assert_eq!(task.progress, 0);
            continue;
        }
        let sum: u32 = task.children.iter().map(|c| u32::from(c.progress)).sum();
        let expected = (f64::from(sum) / task.children.len() as f64).round() as u8;
        assert_eq!(task.progress, expected, "task {}", task.name);
    }

    let billing = chart.tasks.iter().find(|t| t.name == "Billing").unwrap();
    assert_eq!(billing.progress, 100);

    let login = chart.tasks.iter().find(|t| t.name == "Login").unwrap();
    // Backend (not closed, leaves 0/0) and UI (no children) are both 0.
    assert_eq!(login.progress, 0);
}

#[test]
fn gantt_axis_spans_dataset_with_margin() {
    let fixture = TrackerFixture::standard();
    let chart = gantt_view(&fixture.groups());
    // Working dates span 02-28 .. 04-05; PLANNED targets are excluded.
    assert_eq!(chart.axis.first().copied(), Some(date(2024, 2, 25)));
    assert_eq!(chart.axis.last().copied(), Some(date(2024, 4, 8)));
}

#[test]
fn delay_report_matches_hand_computed_values() {
    let fixture = TrackerFixture::standard();
    let report = task_delays(&fixture.groups());

    let login = report.iter().find(|t| t.task_name == "Login").unwrap();
    let backend = login
        .subtasks
        .iter()
        .find(|s| s.subtask_name == "Backend")
        .unwrap();

    // Dev Complete: planned 03-01, latest actual 03-06 (OAuth) → +5.
    let dev = backend
        .milestones
        .iter()
        .find(|m| m.name == "Dev Complete")
        .unwrap();
    assert_eq!(dev.planned, Some(date(2024, 3, 1)));
    assert_eq!(dev.actual, Some(date(2024, 3, 6)));
    assert_eq!(dev.days_delay, Some(5));

    // In progress has no plan: listed, no delay value.
    let wip = backend
        .milestones
        .iter()
        .find(|m| m.name == "In progress")
        .unwrap();
    assert_eq!(wip.planned, None);
    assert_eq!(wip.days_delay, None);

    assert_eq!(backend.worst_delay, 5);
    assert_eq!(backend.status, DelayStatus::Delayed);

    // UI finished early: -2 shown, excluded from aggregates → on time.
    let ui = login
        .subtasks
        .iter()
        .find(|s| s.subtask_name == "UI")
        .unwrap();
    assert_eq!(ui.milestones[0].days_delay, Some(-2));
    assert_eq!(ui.worst_delay, 0);
    assert_eq!(ui.status, DelayStatus::OnTime);

    assert_eq!(login.delayed_subtasks, 1);
    assert_eq!(login.total_subtasks, 2);
    assert_eq!(login.worst_delay, 5);

    // Worst-first ordering puts Login ahead of Billing and Backup.
    assert_eq!(report[0].task_name, "Login");
}

#[test]
fn user_performance_is_the_delay_engine_scoped_to_one_user() {
    let fixture = TrackerFixture::standard();
    let snapshot = fixture.store.snapshot();
    let report = user_performance(&fixture.groups(), &snapshot.users);

    // Ava has a lane but no milestones anywhere: her one entry is pending.
    let ava = report.iter().find(|p| p.user.full_name == "Ava Patel").unwrap();
    assert_eq!(ava.tasks.len(), 1);
    assert_eq!(ava.tasks[0].status, DelayStatus::Pending);
    assert_eq!(ava.total_delayed, 0);

    let dana = report.iter().find(|p| p.user.full_name == "Dana Smith").unwrap();
    assert_eq!(dana.tasks.len(), 1);
    assert_eq!(dana.tasks[0].worst_delay, 5);
    assert!((dana.average_delay - 5.0).abs() < f64::EPSILON);

    // Riley: UI on time, Invoices closed with no plan for CLOSED → both
    // entries, none delayed.
    let riley = report.iter().find(|p| p.user.full_name == "Riley Chen").unwrap();
    assert_eq!(riley.tasks.len(), 2);
    assert_eq!(riley.total_delayed, 0);
}

#[test]
fn kanban_respects_configured_columns_and_closed_filter() {
    let fixture = TrackerFixture::standard();
    let config = TrackerConfig::default();
    let groups = fixture.groups();

    let columns = kanban_view(&groups, &config.milestone_options, &KanbanFilter::default());
    let count = |key: &str| {
        columns
            .iter()
            .find(|c| c.key == key)
            .map_or(0, |c| c.cards.len())
    };
    // Dev Complete: Login plan + Backend lane + OAuth leaf + UI lane, and
    // the Billing plan. CLOSED: the Invoices milestone.
    assert_eq!(count("dev-complete"), 5);
    assert_eq!(count("closed"), 1);
    assert_eq!(count("in-progress"), 3);

    let hidden = kanban_view(
        &groups,
        &config.milestone_options,
        &KanbanFilter {
            engineer_name: None,
            hide_closed: true,
        },
    );
    let hidden_count = |key: &str| {
        hidden
            .iter()
            .find(|c| c.key == key)
            .map_or(0, |c| c.cards.len())
    };
    // Billing disappears entirely: its plan and CLOSED cards go with it.
    assert_eq!(hidden_count("dev-complete"), 4);
    assert_eq!(hidden_count("closed"), 0);
}

#[test]
fn workload_counts_assignments_and_shares() {
    let fixture = TrackerFixture::standard();
    let snapshot = fixture.store.snapshot();
    let report = workload_view(&fixture.groups(), &snapshot.users);

    // Dana: Backend. Riley: UI + Invoices. Ava: Ops. Leaves are unassigned.
    assert_eq!(report.total_items, 4);
    let by_name = |name: &str| {
        report
            .per_user
            .iter()
            .find(|l| l.user.full_name == name)
            .unwrap()
    };
    assert_eq!(by_name("Riley Chen").total(), 2);
    assert_eq!(by_name("Riley Chen").share_percent, 50);
    assert_eq!(by_name("Riley Chen").task_ids.len(), 2);
    assert_eq!(by_name("Dana Smith").by_category.dev, 1);
    assert_eq!(report.per_user[0].user.full_name, "Riley Chen");
}

#[test]
fn breakdown_attributes_leaf_milestones_to_the_lane_assignee() {
    let fixture = TrackerFixture::standard();
    let breakdowns = user_breakdowns(&fixture.groups());

    let dana = breakdowns
        .iter()
        .find(|b| b.user_name == "Dana Smith")
        .unwrap();
    // Backend: lane Dev Complete + roll-up copies (Dev Complete advanced,
    // In progress created) + OAuth's two + Sessions' one.
    assert_eq!(dana.total_milestones, 5);
    assert_eq!(dana.tasks.len(), 1);
    assert!((dana.tasks[0].percent - 100.0).abs() < f64::EPSILON);

    let riley = breakdowns
        .iter()
        .find(|b| b.user_name == "Riley Chen")
        .unwrap();
    assert_eq!(riley.tasks.len(), 2);
    let share_sum: f64 = riley.tasks.iter().map(|t| t.percent).sum();
    assert!((share_sum - 100.0).abs() < 1e-9);
}

#[test]
fn engines_are_idempotent_over_an_unchanged_snapshot() {
    let fixture = TrackerFixture::standard();
    let snapshot = fixture.store.snapshot();
    let config = TrackerConfig::default();

    let groups_a = assemble(&snapshot);
    let groups_b = assemble(&snapshot);
    assert_eq!(groups_a, groups_b);

    assert_eq!(
        calendar_view(&groups_a, &CalendarFilter::default()),
        calendar_view(&groups_b, &CalendarFilter::default())
    );
    assert_eq!(gantt_view(&groups_a), gantt_view(&groups_b));
    assert_eq!(
        kanban_view(&groups_a, &config.milestone_options, &KanbanFilter::default()),
        kanban_view(&groups_b, &config.milestone_options, &KanbanFilter::default())
    );
    assert_eq!(task_delays(&groups_a), task_delays(&groups_b));
    assert_eq!(
        workload_view(&groups_a, &snapshot.users),
        workload_view(&groups_b, &snapshot.users)
    );
    assert_eq!(user_breakdowns(&groups_a), user_breakdowns(&groups_b));
    assert_eq!(
        milestone_texts(&groups_a),
        milestone_texts(&groups_b)
    );
}

#[test]
fn loader_drives_the_store_as_a_snapshot_source() {
    let fixture = TrackerFixture::standard();
    let mut loader = SnapshotLoader::new();
    let ctx = FetchContext::for_user(fixture.user_id("Ava Patel"), "default");

    loader.refresh_blocking(&fixture.store, &ctx);
    let snapshot = loader.snapshot().expect("snapshot loaded");
    assert_eq!(snapshot, &fixture.store.snapshot());

    // Tasks arrive category-sorted: dev, infra, support.
    let names: Vec<&str> = snapshot.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Login", "Backup", "Billing"]);
}
