//! Concurrent claim arbitration.

use super::helpers::Harness;
use foreman::task::domain::Task;
use foreman::task::services::{ClaimTaskRequest, FacadeError};
use rstest::{fixture, rstest};
use tokio::task::JoinSet;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claims_yield_exactly_one_winner(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let mut claims = JoinSet::new();
    for index in 0..2 {
        let facade = harness.facade.clone();
        claims.spawn(async move {
            facade
                .claim_task(
                    ClaimTaskRequest::new(
                        format!("cluster-a-m{index}"),
                        format!("agent-{index}"),
                    )
                    .with_scope("team-a"),
                )
                .await
        });
    }

    let mut winners: Vec<Task> = Vec::new();
    let mut losers: Vec<FacadeError> = Vec::new();
    while let Some(joined) = claims.join_next().await {
        match joined.expect("claim task must not panic") {
            Ok(task) => winners.push(task),
            Err(err) => losers.push(err),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one claimer may win");
    assert_eq!(losers.len(), 1, "exactly one claimer must lose");
    match &losers[0] {
        FacadeError::NoTask | FacadeError::Conflict(_) => {}
        other => panic!("loser must see no-task or conflict, got {other:?}"),
    }

    let task = harness.facade.get_task("T1").await.expect("task exists");
    assert_eq!(task.version(), 2);
    assert!(task.queue().is_claimed());
    assert_eq!(task.claimed_by(), winners[0].claimed_by());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn many_claimers_drain_queue_without_double_claims(harness: Harness) {
    for index in 0..4 {
        harness.create_task(&format!("T{index}"), "team-a").await;
    }

    let mut claims = JoinSet::new();
    for index in 0..8 {
        let facade = harness.facade.clone();
        claims.spawn(async move {
            facade
                .claim_task(
                    ClaimTaskRequest::new(
                        format!("cluster-a-m{index}"),
                        format!("agent-{index}"),
                    )
                    .with_scope("team-a"),
                )
                .await
        });
    }

    let mut claimed_keys: Vec<String> = Vec::new();
    while let Some(joined) = claims.join_next().await {
        if let Ok(task) = joined.expect("claim task must not panic") {
            claimed_keys.push(task.key().as_str().to_owned());
        }
    }

    claimed_keys.sort();
    let total = claimed_keys.len();
    claimed_keys.dedup();
    assert_eq!(claimed_keys.len(), total, "no task may be claimed twice");
    assert_eq!(total, 4, "every pending task is claimed exactly once");
}
