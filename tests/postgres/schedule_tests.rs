//! Serialised attach and aggregation tests against `PostgreSQL`.

use crate::postgres::helpers::{
    BoxError, PreparedRepos, insert_worker, monday_at, prepared_repos,
};
use chrono::Duration;
use mockable::DefaultClock;
use neutra::schedule::{
    domain::{AssignmentStatus, Period, TimeWindow, WorkAssignment, WorkerId},
    ports::{AssignmentRepository, ScheduleRepositoryError},
    services::WorkedTimeAggregator,
};
use rstest::rstest;
use std::sync::Arc;

fn scheduled_assignment(hour: u32, minute: u32, duration: i64) -> WorkAssignment {
    let window = TimeWindow::new(monday_at(hour, minute), duration).expect("valid window");
    WorkAssignment::new(window, AssignmentStatus::Scheduled, &DefaultClock)
        .expect("valid assignment")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attach_persists_through_the_locked_transaction(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, Some(40)).expect("worker row");
    let assignment = scheduled_assignment(9, 0, 60);
    repos.assignments.store(&assignment).await.expect("store");

    let attached = repos
        .assignments
        .attach_worker_checked(assignment.id(), worker, monday_at(8, 0))
        .await
        .expect("attach should succeed");
    assert_eq!(attached.worker_id(), Some(worker));

    let fetched = repos
        .assignments
        .find_by_id(assignment.id())
        .await
        .expect("lookup")
        .expect("assignment exists");
    assert_eq!(fetched.worker_id(), Some(worker));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attach_into_occupied_slot_fails_and_writes_nothing(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, None).expect("worker row");

    let booked = scheduled_assignment(9, 0, 60);
    repos.assignments.store(&booked).await.expect("store");
    repos
        .assignments
        .attach_worker_checked(booked.id(), worker, monday_at(8, 0))
        .await
        .expect("first attach");

    let straddling = scheduled_assignment(9, 30, 60);
    repos.assignments.store(&straddling).await.expect("store");
    let result = repos
        .assignments
        .attach_worker_checked(straddling.id(), worker, monday_at(8, 5))
        .await;

    assert!(matches!(
        result,
        Err(ScheduleRepositoryError::ScheduleConflict { worker_id, ref conflicting })
            if worker_id == worker && conflicting == &vec![booked.id()]
    ));

    let unchanged = repos
        .assignments
        .find_by_id(straddling.id())
        .await
        .expect("lookup")
        .expect("assignment exists");
    assert_eq!(unchanged.worker_id(), None, "the rejected attach rolled back");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn touching_windows_attach_cleanly(prepared_repos: Result<PreparedRepos, BoxError>) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, None).expect("worker row");

    let morning = scheduled_assignment(9, 0, 60);
    let adjacent = scheduled_assignment(10, 0, 60);
    repos.assignments.store(&morning).await.expect("store");
    repos.assignments.store(&adjacent).await.expect("store");

    repos
        .assignments
        .attach_worker_checked(morning.id(), worker, monday_at(8, 0))
        .await
        .expect("first attach");
    repos
        .assignments
        .attach_worker_checked(adjacent.id(), worker, monday_at(8, 1))
        .await
        .expect("touching windows must not conflict");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_attaches_into_one_slot_have_exactly_one_winner(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, None).expect("worker row");

    let mut ids = Vec::new();
    for _ in 0..6 {
        let assignment = scheduled_assignment(9, 0, 60);
        repos.assignments.store(&assignment).await.expect("store");
        ids.push(assignment.id());
    }

    let mut attaches = tokio::task::JoinSet::new();
    for id in ids {
        let assignments = repos.assignments.clone();
        attaches
            .spawn(async move { assignments.attach_worker_checked(id, worker, monday_at(8, 0)).await });
    }

    let mut winners = 0_usize;
    let mut conflicts = 0_usize;
    while let Some(joined) = attaches.join_next().await {
        match joined.expect("attach task must not panic") {
            Ok(_) => winners += 1,
            Err(ScheduleRepositoryError::ScheduleConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected attach error: {other}"),
        }
    }

    assert_eq!(winners, 1, "the worker row lock admits a single winner");
    assert_eq!(conflicts, 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attach_to_missing_worker_or_assignment_is_reported(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, None).expect("worker row");

    let assignment = scheduled_assignment(9, 0, 60);
    repos.assignments.store(&assignment).await.expect("store");

    let ghost_worker = WorkerId::new();
    let result = repos
        .assignments
        .attach_worker_checked(assignment.id(), ghost_worker, monday_at(8, 0))
        .await;
    assert!(matches!(
        result,
        Err(ScheduleRepositoryError::WorkerNotFound(id)) if id == ghost_worker
    ));

    let ghost_assignment = scheduled_assignment(11, 0, 60);
    let missing = repos
        .assignments
        .attach_worker_checked(ghost_assignment.id(), worker, monday_at(8, 0))
        .await;
    assert!(matches!(
        missing,
        Err(ScheduleRepositoryError::AssignmentNotFound(id)) if id == ghost_assignment.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reschedule_excludes_itself_and_respects_colleagues(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, None).expect("worker row");

    let first = scheduled_assignment(9, 0, 60);
    let second = scheduled_assignment(11, 0, 60);
    repos.assignments.store(&first).await.expect("store");
    repos.assignments.store(&second).await.expect("store");
    repos
        .assignments
        .attach_worker_checked(first.id(), worker, monday_at(8, 0))
        .await
        .expect("first attach");
    repos
        .assignments
        .attach_worker_checked(second.id(), worker, monday_at(8, 1))
        .await
        .expect("second attach");

    // Sliding within its own slot is fine.
    let slid = repos
        .assignments
        .reschedule_checked(
            first.id(),
            TimeWindow::new(monday_at(9, 15), 60).expect("valid window"),
            monday_at(8, 2),
        )
        .await
        .expect("self-overlap must not conflict");
    assert_eq!(slid.window().start(), monday_at(9, 15));

    // Sliding into the colleague's slot is not.
    let result = repos
        .assignments
        .reschedule_checked(
            first.id(),
            TimeWindow::new(monday_at(10, 30), 60).expect("valid window"),
            monday_at(8, 3),
        )
        .await;
    assert!(matches!(
        result,
        Err(ScheduleRepositoryError::ScheduleConflict { ref conflicting, .. })
            if conflicting == &vec![second.id()]
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn aggregation_sums_committed_windows_in_the_period(
    prepared_repos: Result<PreparedRepos, BoxError>,
) {
    let repos = prepared_repos.expect("cluster and schema ready");
    let worker = insert_worker(&repos.pool, Some(40)).expect("worker row");
    let assignments = Arc::new(repos.assignments.clone());
    let aggregator = WorkedTimeAggregator::new(Arc::clone(&assignments));

    // 90 scheduled minutes, 60 cancelled minutes, 60 straddling minutes.
    let scheduled = scheduled_assignment(10, 0, 90);
    let mut cancelled = scheduled_assignment(14, 0, 60);
    cancelled
        .transition_to(AssignmentStatus::Cancelled, monday_at(8, 0))
        .expect("cancel");
    let straddling = scheduled_assignment(8, 30, 60);

    for assignment in [&scheduled, &cancelled, &straddling] {
        repos.assignments.store(assignment).await.expect("store");
    }
    for id in [scheduled.id(), straddling.id()] {
        repos
            .assignments
            .attach_worker_checked(id, worker, monday_at(8, 0))
            .await
            .expect("attach");
    }
    // The cancelled job belonged to the worker before it was called off.
    let mut called_off = cancelled.clone();
    called_off.attach_worker(worker, monday_at(8, 0));
    repos.assignments.update(&called_off).await.expect("update");

    let period = Period::new(monday_at(9, 0), monday_at(17, 0)).expect("valid period");
    let worked = aggregator
        .worked_minutes(worker, &period)
        .await
        .expect("aggregation");

    // Full duration of the straddling window counts, the cancelled one
    // contributes nothing.
    assert_eq!(worked, Duration::minutes(150));

    let summary = aggregator
        .weekly_summary(worker, &period)
        .await
        .expect("summary");
    assert_eq!(summary.worked, Duration::minutes(150));
    assert_eq!(summary.expected_weekly_hours, Some(40));
}
