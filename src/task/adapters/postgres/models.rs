//! Diesel row models and domain conversions for task persistence.

use super::schema::{task_history, tasks};
use crate::task::domain::{
    AgentName, HistoryEntry, HistoryEvent, HookSet, NewHistoryEntry, OrchestratorId,
    PersistedTaskData, Priority, Queue, ScopeName, Task, TaskKey,
};
use crate::task::ports::{TaskStoreError, TaskStoreResult};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: String,
    pub queue: String,
    pub priority: String,
    pub role: Option<String>,
    pub task_type: Option<String>,
    pub scope: String,
    pub file_path: String,
    pub branch: String,
    pub project_id: Option<String>,
    pub blocked_by: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub orchestrator_id: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub commits_count: Option<i64>,
    pub turns_used: Option<i64>,
    pub check_results: Option<Value>,
    pub execution_notes: Option<String>,
    pub rejection_count: i64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pr_number: Option<i64>,
    pub hooks: Value,
    pub flow: Option<String>,
    pub flow_overrides: Option<Value>,
    pub auto_accept: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub id: String,
    pub queue: String,
    pub priority: String,
    pub role: Option<String>,
    pub task_type: Option<String>,
    pub scope: String,
    pub file_path: String,
    pub branch: String,
    pub project_id: Option<String>,
    pub blocked_by: Option<String>,
    pub version: i64,
    pub rejection_count: i64,
    pub hooks: Value,
    pub flow: Option<String>,
    pub flow_overrides: Option<Value>,
    pub auto_accept: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full-state changeset applied by the conditional transition write.
///
/// `treat_none_as_null` makes absent lease and submission fields clear
/// their columns, so the row always mirrors the computed post-state.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    pub queue: String,
    pub priority: String,
    pub role: Option<String>,
    pub task_type: Option<String>,
    pub blocked_by: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub orchestrator_id: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub commits_count: Option<i64>,
    pub turns_used: Option<i64>,
    pub check_results: Option<Value>,
    pub execution_notes: Option<String>,
    pub rejection_count: i64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pr_number: Option<i64>,
    pub hooks: Value,
    pub flow: Option<String>,
    pub flow_overrides: Option<Value>,
    pub auto_accept: bool,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for history records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    pub id: Uuid,
    pub task_id: String,
    pub event: String,
    pub agent: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Insert model for history records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_history)]
pub struct NewHistoryRow {
    pub id: Uuid,
    pub task_id: String,
    pub event: String,
    pub agent: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Converts a stored row into the domain aggregate.
pub fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let hooks: HookSet =
        serde_json::from_value(row.hooks).map_err(TaskStoreError::persistence)?;
    let data = PersistedTaskData {
        key: TaskKey::new(row.id).map_err(TaskStoreError::persistence)?,
        queue: Queue::new(row.queue).map_err(TaskStoreError::persistence)?,
        priority: Priority::try_from(row.priority.as_str())
            .map_err(TaskStoreError::persistence)?,
        role: row.role,
        kind: row.task_type,
        scope: ScopeName::new(row.scope).map_err(TaskStoreError::persistence)?,
        file_path: row.file_path,
        branch: row.branch,
        project_id: row.project_id,
        blocked_by: row
            .blocked_by
            .filter(|blocker| !blocker.is_empty())
            .map(TaskKey::new)
            .transpose()
            .map_err(TaskStoreError::persistence)?,
        claimed_by: row
            .claimed_by
            .map(AgentName::new)
            .transpose()
            .map_err(TaskStoreError::persistence)?,
        claimed_at: row.claimed_at,
        orchestrator_id: row
            .orchestrator_id
            .map(OrchestratorId::new)
            .transpose()
            .map_err(TaskStoreError::persistence)?,
        lease_expires_at: row.lease_expires_at,
        version: row.version,
        commits_count: row.commits_count,
        turns_used: row.turns_used,
        check_results: row.check_results,
        execution_notes: row.execution_notes,
        rejection_count: row.rejection_count,
        submitted_at: row.submitted_at,
        completed_at: row.completed_at,
        pr_number: row.pr_number,
        hooks,
        flow: row.flow,
        flow_overrides: row.flow_overrides,
        auto_accept: row.auto_accept,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Task::from_persisted(data))
}

/// Builds the insert row for a freshly created task.
pub fn task_to_new_row(task: &Task) -> TaskStoreResult<NewTaskRow> {
    let hooks = serde_json::to_value(task.hooks()).map_err(TaskStoreError::persistence)?;
    Ok(NewTaskRow {
        id: task.key().as_str().to_owned(),
        queue: task.queue().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        role: task.role().map(str::to_owned),
        task_type: task.kind().map(str::to_owned),
        scope: task.scope().as_str().to_owned(),
        file_path: task.file_path().to_owned(),
        branch: task.branch().to_owned(),
        project_id: task.project_id().map(str::to_owned),
        blocked_by: task.blocked_by().map(|key| key.as_str().to_owned()),
        version: task.version(),
        rejection_count: task.rejection_count(),
        hooks,
        flow: task.flow().map(str::to_owned),
        flow_overrides: task.flow_overrides().cloned(),
        auto_accept: task.auto_accept(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

/// Builds the full-state changeset for a computed post-transition state.
pub fn task_to_changeset(task: &Task) -> TaskStoreResult<TaskChangeset> {
    let hooks = serde_json::to_value(task.hooks()).map_err(TaskStoreError::persistence)?;
    Ok(TaskChangeset {
        queue: task.queue().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        role: task.role().map(str::to_owned),
        task_type: task.kind().map(str::to_owned),
        blocked_by: task.blocked_by().map(|key| key.as_str().to_owned()),
        claimed_by: task.claimed_by().map(|agent| agent.as_str().to_owned()),
        claimed_at: task.claimed_at(),
        orchestrator_id: task.orchestrator_id().map(|id| id.as_str().to_owned()),
        lease_expires_at: task.lease_expires_at(),
        version: task.version(),
        commits_count: task.commits_count(),
        turns_used: task.turns_used(),
        check_results: task.check_results().cloned(),
        execution_notes: task.execution_notes().map(str::to_owned),
        rejection_count: task.rejection_count(),
        submitted_at: task.submitted_at(),
        completed_at: task.completed_at(),
        pr_number: task.pr_number(),
        hooks,
        flow: task.flow().map(str::to_owned),
        flow_overrides: task.flow_overrides().cloned(),
        auto_accept: task.auto_accept(),
        updated_at: task.updated_at(),
    })
}

/// Converts a stored history row into the domain entry.
pub fn row_to_history(row: HistoryRow) -> TaskStoreResult<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.id,
        task: TaskKey::new(row.task_id).map_err(TaskStoreError::persistence)?,
        event: HistoryEvent::try_from(row.event.as_str())
            .map_err(TaskStoreError::persistence)?,
        agent: row.agent,
        details: row.details,
        created_at: row.created_at,
    })
}

/// Builds the insert row for a journal entry.
pub fn history_to_new_row(entry: &NewHistoryEntry, at: DateTime<Utc>) -> NewHistoryRow {
    NewHistoryRow {
        id: Uuid::new_v4(),
        task_id: entry.task.as_str().to_owned(),
        event: entry.event.as_str().to_owned(),
        agent: entry.agent.clone(),
        details: entry.details.clone(),
        created_at: at,
    }
}
