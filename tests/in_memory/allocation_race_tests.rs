//! Concurrency tests for the allocation claim path.

use crate::in_memory::helpers::{AllocationHarness, allocation, registered_tenant};
use neutra::numbering::services::{AssignNumberRequest, NumberAllocationError};
use rstest::rstest;
use std::collections::HashSet;

const RACERS: usize = 16;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claims_for_one_number_have_exactly_one_winner(
    allocation: AllocationHarness,
) {
    allocation
        .service
        .import_numbers(vec!["+3531111111".to_owned()])
        .await
        .expect("import");

    let tenants: Vec<_> = (0..RACERS).map(|_| registered_tenant(&allocation)).collect();
    let mut claims = tokio::task::JoinSet::new();
    for tenant in tenants {
        let service = allocation.service.clone();
        claims.spawn(async move {
            service
                .assign(AssignNumberRequest::new(tenant).with_requested_number("+3531111111"))
                .await
        });
    }

    let mut winners = 0_usize;
    let mut losers = 0_usize;
    while let Some(joined) = claims.join_next().await {
        match joined.expect("claim task must not panic") {
            Ok(assigned) => {
                assert_eq!(assigned.number().as_str(), "+3531111111");
                winners += 1;
            }
            Err(NumberAllocationError::NumberUnavailable(number)) => {
                assert_eq!(number.as_str(), "+3531111111");
                losers += 1;
            }
            Err(other) => panic!("unexpected allocation error: {other}"),
        }
    }

    assert_eq!(winners, 1, "exactly one concurrent claim may win");
    assert_eq!(losers, RACERS - 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_auto_assignments_hand_out_distinct_numbers(allocation: AllocationHarness) {
    let numbers: Vec<String> = (0..RACERS)
        .map(|i| format!("+35312345{i:03}"))
        .collect();
    allocation
        .service
        .import_numbers(numbers)
        .await
        .expect("import");

    let tenants: Vec<_> = (0..RACERS).map(|_| registered_tenant(&allocation)).collect();
    let mut assignments = tokio::task::JoinSet::new();
    for tenant in tenants {
        let service = allocation.service.clone();
        assignments.spawn(async move { service.assign(AssignNumberRequest::new(tenant)).await });
    }

    let mut handed_out = HashSet::new();
    while let Some(joined) = assignments.join_next().await {
        let assigned = joined
            .expect("assignment task must not panic")
            .expect("every tenant fits in the pool");
        assert!(
            handed_out.insert(assigned.number().clone()),
            "number {} was handed out twice",
            assigned.number()
        );
    }

    assert_eq!(handed_out.len(), RACERS);
    let available = allocation
        .service
        .list_available()
        .await
        .expect("listing");
    assert!(available.is_empty(), "the pool is exactly exhausted");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversubscribed_pool_rejects_the_overflow_with_exhaustion(
    allocation: AllocationHarness,
) {
    let pool_size = 4_usize;
    let numbers: Vec<String> = (0..pool_size).map(|i| format!("+35319876{i:03}")).collect();
    allocation
        .service
        .import_numbers(numbers)
        .await
        .expect("import");

    let tenants: Vec<_> = (0..RACERS).map(|_| registered_tenant(&allocation)).collect();
    let mut assignments = tokio::task::JoinSet::new();
    for tenant in tenants {
        let service = allocation.service.clone();
        assignments.spawn(async move { service.assign(AssignNumberRequest::new(tenant)).await });
    }

    let mut winners = 0_usize;
    let mut exhausted = 0_usize;
    while let Some(joined) = assignments.join_next().await {
        match joined.expect("assignment task must not panic") {
            Ok(_) => winners += 1,
            Err(NumberAllocationError::PoolExhausted) => exhausted += 1,
            Err(other) => panic!("unexpected allocation error: {other}"),
        }
    }

    assert_eq!(winners, pool_size, "every pooled number finds a tenant");
    assert_eq!(exhausted, RACERS - pool_size);
}
