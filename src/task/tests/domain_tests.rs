//! Domain-focused tests for task value types and the aggregate.

use super::support::{FrozenClock, pending_task};
use crate::task::domain::{
    HistoryEvent, Hook, HookSet, HookStatus, NewTaskSpec, Priority, Queue, ScopeName,
    Task, TaskDomainError, TaskKey, TaskPatch,
};
use mockable::Clock;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case("", false)]
#[case("   ", false)]
#[case("T1", true)]
#[case("  task-42  ", true)]
fn task_key_validates_non_empty(#[case] raw: &str, #[case] expected_valid: bool) {
    assert_eq!(TaskKey::new(raw).is_ok(), expected_valid);
}

#[rstest]
fn task_key_trims_whitespace() {
    let key = TaskKey::new("  T1  ").expect("valid key");
    assert_eq!(key.as_str(), "T1");
}

#[rstest]
#[case("P0", Priority::P0)]
#[case("p1", Priority::P1)]
#[case(" P2 ", Priority::P2)]
#[case("P3", Priority::P3)]
fn priority_parses_known_labels(#[case] raw: &str, #[case] expected: Priority) {
    assert_eq!(Priority::try_from(raw).expect("valid priority"), expected);
}

#[rstest]
fn priority_rejects_unknown_label() {
    assert!(Priority::try_from("P9").is_err());
}

#[rstest]
fn priority_orders_highest_first() {
    assert!(Priority::P0 < Priority::P1);
    assert!(Priority::P1 < Priority::P2);
    assert!(Priority::P2 < Priority::P3);
}

#[rstest]
fn queue_accepts_free_form_labels() {
    let queue = Queue::new("backlog").expect("valid label");
    assert_eq!(queue.as_str(), "backlog");
    assert!(!queue.is_done());
}

#[rstest]
fn queue_rejects_blank_label() {
    assert_eq!(Queue::new("  "), Err(TaskDomainError::EmptyQueue));
}

#[rstest]
#[case("created", HistoryEvent::Created)]
#[case("review_claimed", HistoryEvent::ReviewClaimed)]
#[case("burnout_detected", HistoryEvent::BurnoutDetected)]
#[case("requeued", HistoryEvent::Requeued)]
fn history_event_round_trips(#[case] raw: &str, #[case] expected: HistoryEvent) {
    let parsed = HistoryEvent::try_from(raw).expect("valid event");
    assert_eq!(parsed, expected);
    assert_eq!(parsed.as_str(), raw);
}

#[rstest]
fn hook_set_completes_named_hook() {
    let mut hooks = HookSet::from_names(["checks", "review"]);
    hooks
        .complete("checks", HookStatus::Passed, Some(json!({"ci": "green"})))
        .expect("known hook");

    let checks = &hooks.hooks()[0];
    assert_eq!(checks.status, HookStatus::Passed);
    assert_eq!(checks.evidence, Some(json!({"ci": "green"})));
    assert_eq!(hooks.hooks()[1].status, HookStatus::Pending);
}

#[rstest]
fn hook_set_rejects_unknown_hook() {
    let mut hooks = HookSet::from_names(["checks"]);
    let result = hooks.complete("missing", HookStatus::Failed, None);
    assert_eq!(result, Err(TaskDomainError::UnknownHook("missing".to_owned())));
}

#[rstest]
fn hook_set_serializes_as_array() {
    let hooks = HookSet::from(vec![Hook::pending("checks")]);
    let value = serde_json::to_value(&hooks).expect("serializable");
    assert_eq!(value, json!([{"name": "checks", "status": "pending"}]));
}

#[rstest]
fn new_task_starts_at_version_one() {
    let clock = FrozenClock::new();
    let task = pending_task("T1", "team-a", clock.utc());

    assert_eq!(task.version(), 1);
    assert!(task.queue().is_incoming());
    assert_eq!(task.rejection_count(), 0);
    assert!(task.claimed_by().is_none());
    assert!(task.lease_expires_at().is_none());
    assert!(task.completed_at().is_none());
}

#[rstest]
fn new_task_rejects_blank_branch() {
    let clock = FrozenClock::new();
    let result = Task::new(
        NewTaskSpec {
            key: TaskKey::new("T1").expect("valid key"),
            scope: ScopeName::new("team-a").expect("valid scope"),
            file_path: "tasks/refactor.md".to_owned(),
            branch: "  ".to_owned(),
            queue: Queue::incoming(),
            priority: Priority::default(),
            role: None,
            kind: None,
            blocked_by: None,
            project_id: None,
            hooks: HookSet::new(),
            flow: None,
            flow_overrides: None,
            auto_accept: false,
        },
        clock.utc(),
    );
    assert_eq!(result, Err(TaskDomainError::EmptyBranch));
}

#[rstest]
fn new_task_rejects_self_dependency() {
    let clock = FrozenClock::new();
    let key = TaskKey::new("T1").expect("valid key");
    let result = Task::new(
        NewTaskSpec {
            key: key.clone(),
            scope: ScopeName::new("team-a").expect("valid scope"),
            file_path: "tasks/refactor.md".to_owned(),
            branch: "main".to_owned(),
            queue: Queue::incoming(),
            priority: Priority::default(),
            role: None,
            kind: None,
            blocked_by: Some(key.clone()),
            project_id: None,
            hooks: HookSet::new(),
            flow: None,
            flow_overrides: None,
            auto_accept: false,
        },
        clock.utc(),
    );
    assert_eq!(result, Err(TaskDomainError::SelfDependency(key)));
}

#[rstest]
fn patch_bumps_version_once() {
    let clock = FrozenClock::new();
    let mut task = pending_task("T1", "team-a", clock.utc());

    let patch = TaskPatch {
        priority: Some(Priority::P0),
        pr_number: Some(Some(42)),
        ..TaskPatch::default()
    };
    task.apply_patch(&patch, clock.utc());

    assert_eq!(task.version(), 2);
    assert_eq!(task.priority(), Priority::P0);
    assert_eq!(task.pr_number(), Some(42));
}

#[rstest]
fn empty_patch_is_a_no_op() {
    let clock = FrozenClock::new();
    let mut task = pending_task("T1", "team-a", clock.utc());
    task.apply_patch(&TaskPatch::default(), clock.utc());
    assert_eq!(task.version(), 1);
}
