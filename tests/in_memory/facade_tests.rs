//! Validation failures and the error taxonomy.

use super::helpers::Harness;
use foreman::registry::domain::RoleDefinition;
use foreman::registry::ports::RoleRegistry;
use foreman::task::domain::{HookSet, HookStatus};
use foreman::task::services::{
    CompleteHookRequest, CreateTaskRequest, ErrorKind, FacadeError, SubmitTaskRequest,
    UpdateTaskRequest,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_blank_scope(harness: Harness) {
    let result = harness
        .facade
        .create_task(CreateTaskRequest::new("T1", "tasks/work.md", "main", "  "))
        .await;

    let err = result.expect_err("creation must fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.kind().status_code(), 400);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_unknown_role_when_roles_registered(harness: Harness) {
    harness
        .roles
        .upsert(&RoleDefinition::new("implement").expect("valid role"))
        .await
        .expect("role registered");

    let result = harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a").with_role("mystery"),
        )
        .await;

    assert!(matches!(result, Err(FacadeError::UnknownRole(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_accepts_any_role_when_none_registered(harness: Harness) {
    let created = harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a").with_role("mystery"),
        )
        .await
        .expect("creation should succeed");
    assert_eq!(created.role(), Some("mystery"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_done_queue(harness: Harness) {
    let result = harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a").with_queue("done"),
        )
        .await;

    assert!(matches!(result, Err(FacadeError::ForbiddenDoneQueue)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_key_conflicts(harness: Harness) {
    harness.create_task("T1", "team-a").await;
    let result = harness
        .facade
        .create_task(CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a"))
        .await;

    assert!(matches!(result, Err(FacadeError::Duplicate(_))));
    let err = result.expect_err("duplicate must fail");
    assert_eq!(err.kind().status_code(), 409);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn patch_rejects_done_queue(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let result = harness
        .facade
        .update_task(
            "T1",
            UpdateTaskRequest {
                queue: Some("done".to_owned()),
                ..UpdateTaskRequest::default()
            },
        )
        .await;

    assert!(matches!(result, Err(FacadeError::ForbiddenDoneQueue)));
    let err = result.expect_err("patch must fail");
    assert_eq!(err.kind().status_code(), 400);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn patch_accepts_free_form_queue_labels(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let updated = harness
        .facade
        .update_task(
            "T1",
            UpdateTaskRequest {
                queue: Some("backlog".to_owned()),
                ..UpdateTaskRequest::default()
            },
        )
        .await
        .expect("patch should succeed");

    assert_eq!(updated.queue().as_str(), "backlog");
    assert_eq!(updated.version(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_rejects_negative_counts(harness: Harness) {
    harness.create_task("T1", "team-a").await;

    let result = harness
        .facade
        .submit_task("T1", SubmitTaskRequest::new(-1, 5))
        .await;

    assert!(matches!(
        result,
        Err(FacadeError::NegativeField { field: "commits_count" })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hook_completion_records_evidence(harness: Harness) {
    harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a")
                .with_hooks(HookSet::from_names(["checks", "review"])),
        )
        .await
        .expect("creation should succeed");

    let updated = harness
        .facade
        .complete_hook(
            "T1",
            "checks",
            CompleteHookRequest::new("passed").with_evidence(json!({"ci": "green"})),
        )
        .await
        .expect("hook completion should succeed");

    let checks = &updated.hooks().hooks()[0];
    assert_eq!(checks.status, HookStatus::Passed);
    assert_eq!(checks.evidence, Some(json!({"ci": "green"})));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hook_completion_rejects_unknown_status(harness: Harness) {
    harness
        .facade
        .create_task(
            CreateTaskRequest::new("T1", "tasks/work.md", "main", "team-a")
                .with_hooks(HookSet::from_names(["checks"])),
        )
        .await
        .expect("creation should succeed");

    let result = harness
        .facade
        .complete_hook("T1", "checks", CompleteHookRequest::new("maybe"))
        .await;

    let err = result.expect_err("unknown status must fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_task_is_not_found(harness: Harness) {
    let result = harness.facade.get_task("ghost").await;
    let err = result.expect_err("lookup must fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind().status_code(), 404);
}
