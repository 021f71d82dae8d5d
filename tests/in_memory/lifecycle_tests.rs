//! End-to-end lifecycle flows through the facade.

use super::helpers::Harness;
use foreman::task::domain::{HistoryEvent, Queue};
use foreman::task::ports::TaskStore;
use foreman::task::services::{
    AcceptTaskRequest, ClaimTaskRequest, CreateTaskRequest, FacadeError, RejectTaskRequest,
    SubmitTaskRequest,
};
use chrono::Duration;
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn happy_path_create_claim_submit_accept(harness: Harness) {
    harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a")
                .with_role("implement")
                .with_priority("P1"),
        )
        .await
        .expect("create should succeed");

    let claimed = harness
        .facade
        .claim_task(
            ClaimTaskRequest::new("cluster-a-m1", "agent-1")
                .with_scope("team-a")
                .with_role("implement"),
        )
        .await
        .expect("claim should succeed");
    assert_eq!(claimed.key().as_str(), "T1");
    assert!(claimed.queue().is_claimed());
    assert_eq!(
        claimed.lease_expires_at(),
        Some(harness.clock.utc() + Duration::seconds(300))
    );

    let submitted = harness
        .facade
        .submit_task(
            "T1",
            SubmitTaskRequest::new(3, 10).with_check_results(json!({"ci": "green"})),
        )
        .await
        .expect("submit should succeed");
    assert!(submitted.queue().is_provisional());
    assert_eq!(submitted.commits_count(), Some(3));
    assert!(submitted.submitted_at().is_some());

    let accepted = harness
        .facade
        .accept_task("T1", AcceptTaskRequest::new("reviewer"))
        .await
        .expect("accept should succeed");
    assert!(accepted.queue().is_done());
    assert!(accepted.completed_at().is_some());

    let history = harness
        .facade
        .task_history("T1")
        .await
        .expect("history should succeed");
    let events: Vec<HistoryEvent> = history.iter().map(|entry| entry.event).collect();
    assert_eq!(
        events,
        vec![
            HistoryEvent::Created,
            HistoryEvent::Claimed,
            HistoryEvent::Submitted,
            HistoryEvent::Accepted,
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn version_counts_each_transition(harness: Harness) {
    let created = harness.create_task("T1", "team-a").await;
    assert_eq!(created.version(), 1);

    let claimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");
    assert_eq!(claimed.version(), 2);

    let submitted = harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(1, 2))
        .await
        .expect("submit should succeed");
    assert_eq!(submitted.version(), 3);

    let accepted = harness
        .facade
        .accept_task("T1", AcceptTaskRequest::new("reviewer"))
        .await
        .expect("accept should succeed");
    assert_eq!(accepted.version(), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn burnout_submission_routes_aside(harness: Harness) {
    harness.create_task("T2", "team-a").await;
    harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");

    let submitted = harness
        .facade
        .submit_task("T2", SubmitTaskRequest::new(0, 85))
        .await
        .expect("submit should succeed");
    assert_eq!(submitted.queue().as_str(), Queue::NEEDS_CONTINUATION);

    let history = harness
        .facade
        .task_history("T2")
        .await
        .expect("history should succeed");
    let burnout = history
        .iter()
        .find(|entry| entry.event == HistoryEvent::BurnoutDetected)
        .expect("burnout entry recorded");
    assert_eq!(
        burnout.details,
        Some(json!({"turns_used": 85, "threshold": 80}))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reject_cycle_returns_task_to_pool(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");
    harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(1, 5))
        .await
        .expect("submit should succeed");

    let rejected = harness
        .facade
        .reject_task("T1", RejectTaskRequest::new("tests missing", "reviewer"))
        .await
        .expect("reject should succeed");

    assert!(rejected.queue().is_incoming());
    assert_eq!(rejected.rejection_count(), 1);
    assert!(rejected.claimed_by().is_none());
    assert!(rejected.orchestrator_id().is_none());
    assert!(rejected.lease_expires_at().is_none());

    // A fresh agent can pick the task back up.
    let reclaimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m2", "agent-2").with_scope("team-a"))
        .await
        .expect("reclaim should succeed");
    assert_eq!(reclaimed.key().as_str(), "T1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_requires_provisional(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let result = harness
        .facade
        .accept_task("T1", AcceptTaskRequest::new("reviewer"))
        .await;

    assert!(matches!(result, Err(FacadeError::Rejected(_))));
    let err = result.expect_err("accept must fail");
    assert_eq!(err.kind().status_code(), 409);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unblock_cascade_after_accept(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .create_task(
            CreateTaskRequest::new("T2", "tasks/follow-up.md", "main", "team-a")
                .with_blocked_by("T1"),
        )
        .await
        .expect("dependent creation should succeed");

    harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");
    harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(2, 6))
        .await
        .expect("submit should succeed");
    harness
        .facade
        .accept_task("T1", AcceptTaskRequest::new("reviewer"))
        .await
        .expect("accept should succeed");

    let dependent = harness
        .facade
        .get_task("T2")
        .await
        .expect("dependent exists");
    assert!(dependent.blocked_by().is_none());

    // The dependent is claimable now that its blocker is resolved.
    let reclaimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");
    assert_eq!(reclaimed.key().as_str(), "T2");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocked_dependent_is_never_claimable(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .create_task(
            CreateTaskRequest::new("T2", "tasks/follow-up.md", "main", "team-a")
                .with_blocked_by("T1")
                .with_priority("P0"),
        )
        .await
        .expect("dependent creation should succeed");

    // Despite its higher priority, the dependent must be skipped.
    let claimed = harness
        .facade
        .claim_task(ClaimTaskRequest::new("cluster-a-m1", "agent-1").with_scope("team-a"))
        .await
        .expect("claim should succeed");
    assert_eq!(claimed.key().as_str(), "T1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cascades_history(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    harness
        .facade
        .delete_task("T1")
        .await
        .expect("delete should succeed");

    let result = harness.facade.get_task("T1").await;
    assert!(matches!(result, Err(FacadeError::NotFound(_))));

    let history = harness
        .store
        .history(&foreman::task::domain::TaskKey::new("T1").expect("valid key"))
        .await
        .expect("history lookup");
    assert!(history.is_empty());
}
