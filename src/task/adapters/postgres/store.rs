//! `PostgreSQL` task store.
//!
//! Every transition commits through one conditional `UPDATE` predicated
//! on `(id, queue, version)`; there are no multi-statement transactions
//! and no long-held locks.

use super::{
    models::{
        HistoryRow, TaskRow, history_to_new_row, row_to_history, row_to_task, task_to_changeset,
        task_to_new_row,
    },
    schema::{task_history, tasks},
};
use crate::task::{
    domain::{HistoryEntry, NewHistoryEntry, Queue, ScopeName, Task, TaskKey},
    ports::{ClaimCriteria, TaskFilter, TaskStore, TaskStoreError, TaskStoreResult,
        TransitionWrite},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::persistence)?
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn insert(&self, task: &Task) -> TaskStoreResult<()> {
        let key = task.key().clone();
        let new_row = task_to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::Duplicate(key)
                    }
                    _ => TaskStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find(&self, key: &TaskKey) -> TaskStoreResult<Option<Task>> {
        let id = key.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskStoreResult<Vec<Task>> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .filter(tasks::scope.eq(filter.scope.as_str().to_owned()))
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(queue) = &filter.queue {
                query = query.filter(tasks::queue.eq(queue.as_str().to_owned()));
            }
            if let Some(priority) = filter.priority {
                query = query.filter(tasks::priority.eq(priority.as_str()));
            }
            let rows = query
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .limit(filter.limit)
                .offset(filter.offset)
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn count_in_queue(&self, scope: &ScopeName, queue: &Queue) -> TaskStoreResult<i64> {
        let scope = scope.as_str().to_owned();
        let queue = queue.as_str().to_owned();
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::scope.eq(scope))
                .filter(tasks::queue.eq(queue))
                .count()
                .get_result::<i64>(connection)
                .map_err(TaskStoreError::persistence)
        })
        .await
    }

    async fn next_claimable(&self, criteria: &ClaimCriteria) -> TaskStoreResult<Option<Task>> {
        let criteria = criteria.clone();
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .filter(tasks::queue.eq(criteria.queue.as_str().to_owned()))
                .filter(tasks::scope.eq(criteria.scope.as_str().to_owned()))
                .filter(tasks::blocked_by.is_null().or(tasks::blocked_by.eq("")))
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(roles) = &criteria.roles {
                query = query.filter(tasks::role.eq_any(roles.labels().to_vec()));
            }
            if let Some(kinds) = &criteria.kinds {
                query = query.filter(tasks::task_type.eq_any(kinds.labels().to_vec()));
            }
            let row = query
                .order((tasks::priority.asc(), tasks::created_at.asc()))
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskStoreError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn commit(&self, write: TransitionWrite<'_>) -> TaskStoreResult<bool> {
        let id = write.task.key().as_str().to_owned();
        let expected_queue = write.expected_queue.as_str().to_owned();
        let expected_version = write.expected_version;
        let changeset = task_to_changeset(write.task)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(id))
                    .filter(tasks::queue.eq(expected_queue))
                    .filter(tasks::version.eq(expected_version)),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(TaskStoreError::persistence)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete(&self, key: &TaskKey) -> TaskStoreResult<bool> {
        let id = key.as_str().to_owned();
        self.run_blocking(move |connection| {
            // History rows go with the task via the FK cascade.
            let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id)))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn clear_dependents(
        &self,
        blocker: &TaskKey,
        now: DateTime<Utc>,
    ) -> TaskStoreResult<u64> {
        let blocker = blocker.as_str().to_owned();
        self.run_blocking(move |connection| {
            let released = diesel::update(tasks::table.filter(tasks::blocked_by.eq(blocker)))
                .set((
                    tasks::blocked_by.eq(None::<String>),
                    tasks::version.eq(tasks::version + 1),
                    tasks::updated_at.eq(now),
                ))
                .execute(connection)
                .map_err(TaskStoreError::persistence)?;
            Ok(u64::try_from(released).unwrap_or(u64::MAX))
        })
        .await
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = diesel::update(
                tasks::table
                    .filter(tasks::queue.eq(Queue::CLAIMED))
                    .filter(tasks::lease_expires_at.lt(now)),
            )
            .set((
                tasks::queue.eq(Queue::INCOMING),
                tasks::claimed_by.eq(None::<String>),
                tasks::claimed_at.eq(None::<DateTime<Utc>>),
                tasks::orchestrator_id.eq(None::<String>),
                tasks::lease_expires_at.eq(None::<DateTime<Utc>>),
                tasks::updated_at.eq(now),
            ))
            .get_results::<TaskRow>(connection)
            .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn append_history(
        &self,
        entry: &NewHistoryEntry,
        at: DateTime<Utc>,
    ) -> TaskStoreResult<HistoryEntry> {
        let new_row = history_to_new_row(entry, at);
        self.run_blocking(move |connection| {
            let row = diesel::insert_into(task_history::table)
                .values(&new_row)
                .get_result::<HistoryRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            row_to_history(row)
        })
        .await
    }

    async fn history(&self, key: &TaskKey) -> TaskStoreResult<Vec<HistoryEntry>> {
        let id = key.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = task_history::table
                .filter(task_history::task_id.eq(id))
                .order(task_history::created_at.asc())
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)
                .map_err(TaskStoreError::persistence)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }
}
