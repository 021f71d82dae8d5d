//! Store port for task persistence and conditional transitions.
//!
//! The store is the only shared resource of the server. Access is via
//! short, non-interactive statements; [`TaskStore::commit`] must be a
//! single conditional write so partial transitions are impossible.

use crate::task::domain::{
    HistoryEntry, LabelFilter, NewHistoryEntry, Priority, Queue, ScopeName, Task, TaskKey,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Conditional write of a fully computed post-transition state.
///
/// The predicate covers identity, the observed queue, and the observed
/// version; `task.version()` must equal `expected_version + 1`.
#[derive(Debug, Clone)]
pub struct TransitionWrite<'a> {
    /// Post-transition aggregate to persist.
    pub task: &'a Task,
    /// Queue the caller observed before computing the post-state.
    pub expected_queue: Queue,
    /// Version the caller observed before computing the post-state.
    pub expected_version: i64,
}

/// Selection criteria for the claim query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCriteria {
    /// Tenant partition the claim is made under.
    pub scope: ScopeName,
    /// Queue to select from.
    pub queue: Queue,
    /// Optional role filter.
    pub roles: Option<LabelFilter>,
    /// Optional type filter.
    pub kinds: Option<LabelFilter>,
}

/// Scope-partitioned listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    /// Tenant partition; mandatory for all visibility queries.
    pub scope: ScopeName,
    /// Optional queue restriction.
    pub queue: Option<Queue>,
    /// Optional priority restriction.
    pub priority: Option<Priority>,
    /// Maximum rows returned.
    pub limit: i64,
    /// Rows skipped before the first returned.
    pub offset: i64,
}

impl TaskFilter {
    /// Creates a filter over a scope with the given page size.
    #[must_use]
    pub const fn for_scope(scope: ScopeName, limit: i64) -> Self {
        Self {
            scope,
            queue: None,
            priority: None,
            limit,
            offset: 0,
        }
    }

    /// Restricts the filter to one queue.
    #[must_use]
    pub fn with_queue(mut self, queue: Queue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Restricts the filter to one priority class.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Skips the given number of rows.
    #[must_use]
    pub const fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Duplicate`] when the key already exists.
    async fn insert(&self, task: &Task) -> TaskStoreResult<()>;

    /// Finds a task by key.
    ///
    /// Returns `None` when the task does not exist.
    async fn find(&self, key: &TaskKey) -> TaskStoreResult<Option<Task>>;

    /// Lists tasks within a scope, newest first.
    async fn list(&self, filter: &TaskFilter) -> TaskStoreResult<Vec<Task>>;

    /// Counts tasks in one queue of a scope.
    async fn count_in_queue(&self, scope: &ScopeName, queue: &Queue) -> TaskStoreResult<i64>;

    /// Returns the single most eligible claimable task, or `None`.
    ///
    /// Eligibility: the criteria queue and scope, an absent dependency,
    /// and the role/type filters when present. Ordering: priority
    /// ascending (P0 first), then creation time ascending.
    async fn next_claimable(&self, criteria: &ClaimCriteria) -> TaskStoreResult<Option<Task>>;

    /// Commits a transition as one conditional write.
    ///
    /// Returns `false` when the predicate matched zero rows, in which
    /// case nothing was written and no side effects may run.
    async fn commit(&self, write: TransitionWrite<'_>) -> TaskStoreResult<bool>;

    /// Deletes a task, cascading its history.
    ///
    /// Returns `false` when the task did not exist.
    async fn delete(&self, key: &TaskKey) -> TaskStoreResult<bool>;

    /// Clears `blocked_by` on every task depending on the blocker.
    ///
    /// Returns the number of dependents released.
    async fn clear_dependents(&self, blocker: &TaskKey, now: DateTime<Utc>)
    -> TaskStoreResult<u64>;

    /// Returns every `claimed` task whose lease expired strictly before
    /// `now` to the pending pool, clearing its lease fields.
    ///
    /// The released rows are returned in their post-release state so the
    /// caller can journal each one. Versions are deliberately not
    /// bumped; a stale submit from the previous holder still collides on
    /// `queue = claimed`.
    async fn release_expired(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>>;

    /// Appends a history row.
    ///
    /// Best-effort from the engine's point of view: failures are logged
    /// by callers and never invalidate the committed task write.
    async fn append_history(
        &self,
        entry: &NewHistoryEntry,
        at: DateTime<Utc>,
    ) -> TaskStoreResult<HistoryEntry>;

    /// Returns a task's history in append order.
    async fn history(&self, key: &TaskKey) -> TaskStoreResult<Vec<HistoryEntry>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same key already exists.
    #[error("duplicate task key: {0}")]
    Duplicate(TaskKey),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
