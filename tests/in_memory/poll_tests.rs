//! Aggregate scheduler snapshots.

use super::helpers::Harness;
use foreman::registry::domain::FlowDefinition;
use foreman::registry::ports::FlowRegistry;
use foreman::scheduler::{PollError, SchedulerPollService};
use foreman::task::services::{ClaimTaskRequest, SubmitTaskRequest};
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn poll_service(
    harness: &Harness,
) -> SchedulerPollService<
    foreman::task::adapters::memory::InMemoryTaskStore,
    foreman::orchestrator::adapters::memory::InMemoryOrchestratorDirectory,
    foreman::registry::adapters::memory::InMemoryFlowRegistry,
> {
    SchedulerPollService::new(
        Arc::clone(&harness.store),
        Arc::clone(&harness.directory),
        Arc::clone(&harness.flows),
        harness.config.clone(),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snapshot_counts_and_projects_provisional(harness: Harness) {
    let id = harness
        .register_orchestrator("cluster-a", "m1", "team-a")
        .await;
    harness.create_task("T1", "team-a").await;
    harness.create_task("T2", "team-a").await;
    harness
        .facade
        .claim_task(ClaimTaskRequest::new(id.as_str(), "agent-1"))
        .await
        .expect("claim should succeed");
    harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(2, 6))
        .await
        .expect("submit should succeed");
    harness
        .flows
        .upsert(&FlowDefinition::new("default", json!({"stages": ["implement"]}))
            .expect("valid flow"))
        .await
        .expect("flow registered");

    let snapshot = poll_service(&harness)
        .poll(&id, None)
        .await
        .expect("poll should succeed");

    assert_eq!(snapshot.queue_counts.incoming, 1);
    assert_eq!(snapshot.queue_counts.claimed, 0);
    assert_eq!(snapshot.queue_counts.provisional, 1);
    assert!(snapshot.orchestrator_registered);
    assert_eq!(snapshot.scope.as_str(), "team-a");
    assert_eq!(snapshot.provisional.len(), 1);
    assert_eq!(snapshot.provisional[0].id.as_str(), "T1");
    assert_eq!(
        snapshot.provisional[0].claimed_by.as_ref().map(|agent| agent.as_str()),
        Some("agent-1")
    );
    assert_eq!(snapshot.flows.len(), 1);
    assert_eq!(snapshot.flows[0].name(), "default");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_scope_overrides_registration(harness: Harness) {
    let id = harness
        .register_orchestrator("cluster-a", "m1", "team-a")
        .await;
    harness.create_task("T1", "team-b").await;

    let snapshot = poll_service(&harness)
        .poll(&id, Some("team-b".to_owned()))
        .await
        .expect("poll should succeed");

    assert_eq!(snapshot.scope.as_str(), "team-b");
    assert_eq!(snapshot.queue_counts.incoming, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_orchestrator_without_scope_is_rejected(harness: Harness) {
    let result = poll_service(&harness).poll("cluster-x-m9", None).await;
    assert!(matches!(result, Err(PollError::MissingScope)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_orchestrator_with_scope_is_flagged(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let snapshot = poll_service(&harness)
        .poll("cluster-x-m9", Some("team-a".to_owned()))
        .await
        .expect("poll should succeed");

    assert!(!snapshot.orchestrator_registered);
    assert_eq!(snapshot.queue_counts.incoming, 1);
}
