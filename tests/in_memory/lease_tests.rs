//! Lease expiry and reconciler sweeps.

use super::helpers::Harness;
use foreman::orchestrator::domain::OrchestratorStatus;
use foreman::orchestrator::ports::OrchestratorDirectory;
use foreman::task::domain::{HistoryEvent, OrchestratorId};
use foreman::task::services::{ClaimTaskRequest, SubmitTaskRequest};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_lease_returns_to_pending_pool(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .claim_task(
            ClaimTaskRequest::new("cluster-a-m1", "agent-1")
                .with_scope("team-a")
                .with_lease_duration_seconds(1),
        )
        .await
        .expect("claim should succeed");

    harness.clock.advance_seconds(2);
    let report = harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");
    assert_eq!(report.released, 1);

    let task = harness.facade.get_task("T1").await.expect("task exists");
    assert!(task.queue().is_incoming());
    assert!(task.claimed_by().is_none());
    assert!(task.lease_expires_at().is_none());

    let history = harness
        .facade
        .task_history("T1")
        .await
        .expect("history should succeed");
    let requeued = history
        .iter()
        .find(|entry| entry.event == HistoryEvent::Requeued)
        .expect("requeued entry recorded");
    assert_eq!(requeued.details, Some(json!({"detail": "Lease expired"})));

    // A fresh agent can claim the released task.
    let reclaimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m2", "agent-2").with_scope("team-a"))
        .await
        .expect("reclaim should succeed");
    assert_eq!(reclaimed.key().as_str(), "T1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn release_does_not_bump_version(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    let claimed = harness
        .facade
        .claim_task(
            ClaimTaskRequest::new("cluster-a-m1", "agent-1")
                .with_scope("team-a")
                .with_lease_duration_seconds(1),
        )
        .await
        .expect("claim should succeed");

    harness.clock.advance_seconds(2);
    harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");

    let task = harness.facade.get_task("T1").await.expect("task exists");
    assert_eq!(task.version(), claimed.version());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_submit_after_release_fails_cleanly(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .claim_task(
            ClaimTaskRequest::new("cluster-a-m1", "agent-1")
                .with_scope("team-a")
                .with_lease_duration_seconds(1),
        )
        .await
        .expect("claim should succeed");

    harness.clock.advance_seconds(2);
    harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");

    // The previous holder wakes up and tries to submit; the task is no
    // longer in `claimed`, so the submit collides and fails.
    let result = harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(1, 3))
        .await;
    let err = result.expect_err("stale submit must fail");
    assert_eq!(err.kind().status_code(), 409);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reconciler_is_idempotent(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .claim_task(
            ClaimTaskRequest::new("cluster-a-m1", "agent-1")
                .with_scope("team-a")
                .with_lease_duration_seconds(1),
        )
        .await
        .expect("claim should succeed");

    harness.clock.advance_seconds(2);
    let first = harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");
    let second = harness
        .reconciler
        .run_once()
        .await
        .expect("second sweep should succeed");

    assert_eq!(first.released, 1);
    assert_eq!(second.released, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_leases_survive_the_sweep(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");

    harness.clock.advance_seconds(60);
    let report = harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");

    assert_eq!(report.released, 0);
    let task = harness.facade.get_task("T1").await.expect("task exists");
    assert!(task.queue().is_claimed());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn silent_orchestrators_are_marked_offline(harness: Harness) {
    let id = harness
        .register_orchestrator("cluster-a", "m1", "team-a")
        .await;

    harness.clock.advance_seconds(180);
    let report = harness
        .reconciler
        .run_once()
        .await
        .expect("sweep should succeed");
    assert_eq!(report.marked_offline, 1);

    let registration = harness
        .directory
        .find(&OrchestratorId::new(id).expect("valid id"))
        .await
        .expect("lookup")
        .expect("registration exists");
    assert_eq!(registration.status(), OrchestratorStatus::Offline);
}
