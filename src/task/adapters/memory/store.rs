//! In-memory task store for tests and development.
//!
//! The write lock makes every mutation atomic, which models the
//! single-statement conditional updates of the relational adapter: a
//! [`TransitionWrite`] either replaces the row while the predicate holds
//! or touches nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::task::{
    domain::{HistoryEntry, NewHistoryEntry, Queue, ScopeName, Task, TaskKey},
    ports::{ClaimCriteria, TaskFilter, TaskStore, TaskStoreError, TaskStoreResult,
        TransitionWrite},
};

/// Thread-safe in-memory task store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskKey, Task>,
    history: Vec<HistoryEntry>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

fn matches_criteria(task: &Task, criteria: &ClaimCriteria) -> bool {
    if task.queue() != &criteria.queue || task.scope() != &criteria.scope {
        return false;
    }
    if task.blocked_by().is_some() {
        return false;
    }
    if let Some(roles) = &criteria.roles {
        if !task.role().is_some_and(|role| roles.contains(role)) {
            return false;
        }
    }
    if let Some(kinds) = &criteria.kinds {
        if !task.kind().is_some_and(|kind| kinds.contains(kind)) {
            return false;
        }
    }
    true
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(task.key()) {
            return Err(TaskStoreError::Duplicate(task.key().clone()));
        }
        state.tasks.insert(task.key().clone(), task.clone());
        Ok(())
    }

    async fn find(&self, key: &TaskKey) -> TaskStoreResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(key).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskStoreResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.scope() == &filter.scope)
            .filter(|task| filter.queue.as_ref().is_none_or(|queue| task.queue() == queue))
            .filter(|task| {
                filter
                    .priority
                    .is_none_or(|priority| task.priority() == priority)
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.key().as_str().cmp(b.key().as_str()))
        });
        let offset = usize::try_from(filter.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit.max(0)).unwrap_or(usize::MAX);
        Ok(tasks.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_in_queue(&self, scope: &ScopeName, queue: &Queue) -> TaskStoreResult<i64> {
        let state = self.state.read().map_err(lock_error)?;
        let count = state
            .tasks
            .values()
            .filter(|task| task.scope() == scope && task.queue() == queue)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn next_claimable(&self, criteria: &ClaimCriteria) -> TaskStoreResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let candidate = state
            .tasks
            .values()
            .filter(|task| matches_criteria(task, criteria))
            .min_by(|a, b| {
                a.priority()
                    .cmp(&b.priority())
                    .then_with(|| a.created_at().cmp(&b.created_at()))
                    .then_with(|| a.key().as_str().cmp(b.key().as_str()))
            })
            .cloned();
        Ok(candidate)
    }

    async fn commit(&self, write: TransitionWrite<'_>) -> TaskStoreResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(current) = state.tasks.get_mut(write.task.key()) else {
            return Ok(false);
        };
        if current.queue() != &write.expected_queue || current.version() != write.expected_version
        {
            return Ok(false);
        }
        *current = write.task.clone();
        Ok(true)
    }

    async fn delete(&self, key: &TaskKey) -> TaskStoreResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let existed = state.tasks.remove(key).is_some();
        if existed {
            state.history.retain(|entry| &entry.task != key);
        }
        Ok(existed)
    }

    async fn clear_dependents(
        &self,
        blocker: &TaskKey,
        now: DateTime<Utc>,
    ) -> TaskStoreResult<u64> {
        let mut state = self.state.write().map_err(lock_error)?;
        let mut released = 0;
        for task in state.tasks.values_mut() {
            if task.blocked_by() == Some(blocker) {
                task.dependency_resolved(now);
                released += 1;
            }
        }
        Ok(released)
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        let mut state = self.state.write().map_err(lock_error)?;
        let mut released = Vec::new();
        for task in state.tasks.values_mut() {
            let expired = task.queue().is_claimed()
                && task.lease_expires_at().is_some_and(|expiry| expiry < now);
            if expired {
                task.release_expired_lease(now);
                released.push(task.clone());
            }
        }
        Ok(released)
    }

    async fn append_history(
        &self,
        entry: &NewHistoryEntry,
        at: DateTime<Utc>,
    ) -> TaskStoreResult<HistoryEntry> {
        let mut state = self.state.write().map_err(lock_error)?;
        let persisted = HistoryEntry {
            id: Uuid::new_v4(),
            task: entry.task.clone(),
            event: entry.event,
            agent: entry.agent.clone(),
            details: entry.details.clone(),
            created_at: at,
        };
        state.history.push(persisted.clone());
        Ok(persisted)
    }

    async fn history(&self, key: &TaskKey) -> TaskStoreResult<Vec<HistoryEntry>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .history
            .iter()
            .filter(|entry| &entry.task == key)
            .cloned()
            .collect())
    }
}
