//! Tenant partition isolation.

use super::helpers::Harness;
use foreman::task::services::{ClaimTaskRequest, FacadeError, ListTasksRequest};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_never_crosses_scopes(harness: Harness) {
    harness.create_task("T1", "scope-a").await;

    let result = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-b-m1", "agent-1").with_scope("scope-b"))
        .await;

    assert!(matches!(result, Err(FacadeError::NoTask)));
    let err = result.expect_err("claim must find nothing");
    assert_eq!(err.kind().status_code(), 404);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_omits_other_scopes(harness: Harness) {
    harness.create_task("T1", "scope-a").await;
    harness.create_task("T2", "scope-b").await;

    let listed = harness
        .facade
        .list_tasks(ListTasksRequest {
            scope: Some("scope-b".to_owned()),
            ..ListTasksRequest::default()
        })
        .await
        .expect("listing should succeed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key().as_str(), "T2");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claim_falls_back_to_registered_scope(harness: Harness) {
    let id = harness
        .register_orchestrator("cluster-a", "m1", "scope-a")
        .await;
    harness.create_task("T1", "scope-a").await;

    // No explicit scope: the orchestrator's registered scope applies.
    let claimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new(id, "agent-1"))
        .await
        .expect("claim should succeed");

    assert_eq!(claimed.key().as_str(), "T1");
    assert_eq!(claimed.scope().as_str(), "scope-a");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_orchestrator_without_scope_is_rejected(harness: Harness) {
    harness.create_task("T1", "scope-a").await;

    let result = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-x-m9", "agent-1"))
        .await;

    assert!(matches!(result, Err(FacadeError::MissingScope)));
    let err = result.expect_err("claim must fail validation");
    assert_eq!(err.kind().status_code(), 400);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_requires_scope(harness: Harness) {
    let result = harness
        .facade
        .list_tasks(ListTasksRequest::default())
        .await;
    assert!(matches!(result, Err(FacadeError::MissingScope)));
}
