//! Shared fixtures for task engine unit tests.

use crate::task::domain::{
    NewTaskSpec, Priority, Queue, ScopeName, Task, TaskKey,
};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, RwLock};

/// Deterministic clock whose instant can be advanced by tests.
#[derive(Debug, Clone)]
pub struct FrozenClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FrozenClock {
    /// Creates a clock frozen at a fixed reference instant.
    pub fn new() -> Self {
        let reference = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid reference instant");
        Self {
            now: Arc::new(RwLock::new(reference)),
        }
    }

    /// Advances the clock by the given number of seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut now = self.now.write().expect("clock lock");
        *now += Duration::seconds(seconds);
    }
}

impl Default for FrozenClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrozenClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock")
    }
}

/// Builds a pending task in the given scope with defaults suitable for
/// transition tests.
pub fn pending_task(key: &str, scope: &str, now: DateTime<Utc>) -> Task {
    task_with(key, scope, Queue::incoming(), now)
}

/// Builds a task in an arbitrary queue.
pub fn task_with(key: &str, scope: &str, queue: Queue, now: DateTime<Utc>) -> Task {
    Task::new(
        NewTaskSpec {
            key: TaskKey::new(key).expect("valid key"),
            scope: ScopeName::new(scope).expect("valid scope"),
            file_path: "tasks/refactor.md".to_owned(),
            branch: "main".to_owned(),
            queue,
            priority: Priority::default(),
            role: None,
            kind: None,
            blocked_by: None,
            project_id: None,
            hooks: crate::task::domain::HookSet::new(),
            flow: None,
            flow_overrides: None,
            auto_accept: false,
        },
        now,
    )
    .expect("valid task spec")
}
