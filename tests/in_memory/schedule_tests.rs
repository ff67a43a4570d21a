//! Scheduling flow tests: racing attaches and end-to-end aggregation.

use crate::in_memory::helpers::{
    ScheduleHarness, monday_at, registered_worker, schedule,
};
use chrono::Duration;
use neutra::schedule::{
    domain::{AssignmentStatus, Period, TimeWindow, WorkerId},
    services::{ConflictDetector, CreateAssignmentRequest, WorkedTimeAggregator},
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_attaches_into_one_slot_have_exactly_one_winner(schedule: ScheduleHarness) {
    let worker = registered_worker(&schedule);
    let mut ids = Vec::new();
    for _ in 0..8 {
        let assignment = schedule
            .service
            .create(CreateAssignmentRequest::new(monday_at(9, 0), 60))
            .await
            .expect("creation");
        ids.push(assignment.id());
    }

    let mut attaches = tokio::task::JoinSet::new();
    for id in ids {
        let service = schedule.service.clone();
        attaches.spawn(async move { service.attach_worker(id, worker).await });
    }

    let mut winners = 0_usize;
    let mut conflicts = 0_usize;
    while let Some(joined) = attaches.join_next().await {
        match joined.expect("attach task must not panic") {
            Ok(attached) => {
                assert_eq!(attached.worker_id(), Some(worker));
                winners += 1;
            }
            Err(err) => {
                assert!(
                    err.conflicting_assignments().is_some(),
                    "losers must observe the conflict, got: {err}"
                );
                conflicts += 1;
            }
        }
    }

    assert_eq!(winners, 1, "exactly one attach may claim the slot");
    assert_eq!(conflicts, 7);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn advisory_check_and_transactional_attach_agree(schedule: ScheduleHarness) {
    let worker = registered_worker(&schedule);
    let detector = ConflictDetector::new(Arc::clone(&schedule.repository));

    let booked = schedule
        .service
        .create(CreateAssignmentRequest::new(monday_at(9, 0), 60))
        .await
        .expect("creation");
    schedule
        .service
        .attach_worker(booked.id(), worker)
        .await
        .expect("attach");

    let overlapping = TimeWindow::new(monday_at(9, 30), 30).expect("valid window");
    let outcome = detector
        .check(worker, overlapping, None)
        .await
        .expect("check");
    assert_eq!(outcome.conflicting(), &[booked.id()]);

    let adjacent = TimeWindow::new(monday_at(10, 0), 60).expect("valid window");
    let free = detector.check(worker, adjacent, None).await.expect("check");
    assert!(!free.is_conflict());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_worker_has_no_schedule_and_no_worked_time(schedule: ScheduleHarness) {
    let detector = ConflictDetector::new(Arc::clone(&schedule.repository));
    let aggregator = WorkedTimeAggregator::new(Arc::clone(&schedule.repository));
    let ghost = WorkerId::new();

    let window = TimeWindow::new(monday_at(9, 0), 60).expect("valid window");
    let outcome = detector.check(ghost, window, None).await.expect("check");
    assert!(!outcome.is_conflict());

    let period = Period::new(monday_at(0, 0), monday_at(23, 0)).expect("valid period");
    let worked = aggregator
        .worked_minutes(ghost, &period)
        .await
        .expect("aggregation");
    assert_eq!(worked, Duration::zero());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_flows_into_the_weekly_summary(schedule: ScheduleHarness) {
    let worker = registered_worker(&schedule);
    let aggregator = WorkedTimeAggregator::new(Arc::clone(&schedule.repository));

    let morning = schedule
        .service
        .create(CreateAssignmentRequest::new(monday_at(9, 0), 90))
        .await
        .expect("creation");
    schedule
        .service
        .attach_worker(morning.id(), worker)
        .await
        .expect("attach");
    schedule
        .service
        .transition(morning.id(), AssignmentStatus::InProgress)
        .await
        .expect("start");
    schedule
        .service
        .transition(morning.id(), AssignmentStatus::Completed)
        .await
        .expect("complete");

    let afternoon = schedule
        .service
        .create(CreateAssignmentRequest::new(monday_at(14, 0), 60))
        .await
        .expect("creation");
    schedule
        .service
        .attach_worker(afternoon.id(), worker)
        .await
        .expect("attach");
    schedule
        .service
        .transition(afternoon.id(), AssignmentStatus::Cancelled)
        .await
        .expect("cancel");

    let week = Period::new(monday_at(0, 0), monday_at(0, 0) + Duration::days(7))
        .expect("valid period");
    let summary = aggregator
        .weekly_summary(worker, &week)
        .await
        .expect("summary");

    assert_eq!(summary.worked, Duration::minutes(90));
    assert_eq!(summary.expected_weekly_hours, Some(40));
}
