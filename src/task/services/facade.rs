//! The request facade for the five lifecycle operations and their
//! supporting surfaces.
//!
//! For each operation the facade validates the raw payload, resolves the
//! scope, dispatches to the engine or selector, and exposes the error
//! taxonomy a transport shell maps directly onto status codes. Task
//! state is never mutated outside the engine.

use super::engine::{EngineError, TransitionEngine};
use super::selector::{ClaimError, ClaimOutcome, ClaimRequest, ClaimSelector};
use crate::config::CoordinatorConfig;
use crate::orchestrator::ports::{DirectoryError, OrchestratorDirectory};
use crate::registry::ports::{RegistryError, RoleRegistry};
use crate::task::{
    domain::{
        AcceptTransition, AgentName, BurnoutLimits, HistoryEntry, HistoryEvent, HookSet,
        HookStatus, LabelFilter, NewHistoryEntry, NewTaskSpec, OrchestratorId,
        ParseHookStatusError, ParsePriorityError, Priority, Queue, RejectTransition,
        RequeueTransition, ScopeName, SubmitTransition, Task, TaskDomainError, TaskKey, TaskPatch,
        TransitionError, TransitionRequest,
    },
    ports::{TaskFilter, TaskStore, TaskStoreError},
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Caller-supplied globally unique identity.
    pub id: String,
    /// Primary file the task concerns.
    pub file_path: String,
    /// Branch the task targets.
    pub branch: String,
    /// Tenant partition the task belongs to.
    pub scope: String,
    /// Initial queue label; defaults to `incoming`.
    pub queue: Option<String>,
    /// Priority label; defaults to `P2`.
    pub priority: Option<String>,
    /// Role classifier; must be registered when any roles are.
    pub role: Option<String>,
    /// Type classifier.
    pub kind: Option<String>,
    /// Dependency that must reach `done` before claims.
    pub blocked_by: Option<String>,
    /// Owning project.
    pub project_id: Option<String>,
    /// Named sub-gates attached at creation.
    pub hooks: Option<HookSet>,
    /// Declarative pipeline label.
    pub flow: Option<String>,
    /// Per-task flow overrides.
    pub flow_overrides: Option<Value>,
    /// Whether review may be skipped by outer tooling.
    pub auto_accept: Option<bool>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<String>,
        branch: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_path: file_path.into(),
            branch: branch.into(),
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// Sets the initial queue label.
    #[must_use]
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Sets the priority label.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Sets the role classifier.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the type classifier.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the blocking dependency.
    #[must_use]
    pub fn with_blocked_by(mut self, blocked_by: impl Into<String>) -> Self {
        self.blocked_by = Some(blocked_by.into());
        self
    }

    /// Sets the hooks attached at creation.
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Sets the flow label.
    #[must_use]
    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }
}

/// Request payload for claiming a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimTaskRequest {
    /// Fleet member requesting the claim.
    pub orchestrator_id: String,
    /// Agent that will hold the lease.
    pub agent_name: String,
    /// Explicit scope; falls back to the orchestrator's registered
    /// scope.
    pub scope: Option<String>,
    /// Role filter, single label or set.
    pub role_filter: Option<Vec<String>>,
    /// Type filter, single label or set.
    pub type_filter: Option<Vec<String>>,
    /// Queue override.
    pub queue: Option<String>,
    /// Lease length in seconds, clamped to the configured maximum.
    pub lease_duration_seconds: Option<u64>,
}

impl ClaimTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(orchestrator_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            orchestrator_id: orchestrator_id.into(),
            agent_name: agent_name.into(),
            ..Self::default()
        }
    }

    /// Sets the explicit scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets a single-label role filter.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role_filter = Some(vec![role.into()]);
        self
    }

    /// Sets a multi-label role filter.
    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.role_filter = Some(roles.into_iter().collect());
        self
    }

    /// Sets a single-label type filter.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.type_filter = Some(vec![kind.into()]);
        self
    }

    /// Sets the queue override.
    #[must_use]
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Sets the requested lease length.
    #[must_use]
    pub const fn with_lease_duration_seconds(mut self, seconds: u64) -> Self {
        self.lease_duration_seconds = Some(seconds);
        self
    }
}

/// Request payload for submitting work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitTaskRequest {
    /// Commits produced under the lease.
    pub commits_count: i64,
    /// Turns consumed under the lease.
    pub turns_used: i64,
    /// Structured check results.
    pub check_results: Option<Value>,
    /// Free-form execution notes.
    pub execution_notes: Option<String>,
    /// Optional caller-observed version to predicate on.
    pub expected_version: Option<i64>,
}

impl SubmitTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(commits_count: i64, turns_used: i64) -> Self {
        Self {
            commits_count,
            turns_used,
            ..Self::default()
        }
    }

    /// Sets the structured check results.
    #[must_use]
    pub fn with_check_results(mut self, check_results: Value) -> Self {
        self.check_results = Some(check_results);
        self
    }

    /// Sets the execution notes.
    #[must_use]
    pub fn with_execution_notes(mut self, notes: impl Into<String>) -> Self {
        self.execution_notes = Some(notes.into());
        self
    }
}

/// Request payload for accepting a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptTaskRequest {
    /// Reviewer accepting the submission.
    pub accepted_by: String,
}

impl AcceptTaskRequest {
    /// Creates an accept request.
    #[must_use]
    pub fn new(accepted_by: impl Into<String>) -> Self {
        Self {
            accepted_by: accepted_by.into(),
        }
    }
}

/// Request payload for rejecting a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectTaskRequest {
    /// Reason recorded in history.
    pub reason: String,
    /// Reviewer rejecting the submission.
    pub rejected_by: String,
}

impl RejectTaskRequest {
    /// Creates a reject request.
    #[must_use]
    pub fn new(reason: impl Into<String>, rejected_by: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            rejected_by: rejected_by.into(),
        }
    }
}

/// Request payload for relinquishing a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequeueTaskRequest {
    /// Agent relinquishing the claim.
    pub agent: Option<String>,
    /// Detail recorded in history.
    pub detail: Option<String>,
}

/// Request payload for a generic field update.
///
/// Nullable fields use a nested `Option` so callers can distinguish
/// "leave" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    /// Replacement queue label; `done` is rejected.
    pub queue: Option<String>,
    /// Replacement priority label.
    pub priority: Option<String>,
    /// Replacement role classifier.
    pub role: Option<Option<String>>,
    /// Replacement type classifier.
    pub kind: Option<Option<String>>,
    /// Replacement dependency.
    pub blocked_by: Option<Option<String>>,
    /// Replacement pull request number.
    pub pr_number: Option<Option<i64>>,
    /// Replacement flow label.
    pub flow: Option<Option<String>>,
    /// Replacement flow overrides.
    pub flow_overrides: Option<Option<Value>>,
    /// Replacement auto-accept marker.
    pub auto_accept: Option<bool>,
    /// Replacement execution notes.
    pub execution_notes: Option<Option<String>>,
    /// Replacement hook set.
    pub hooks: Option<HookSet>,
}

/// Request payload for completing a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteHookRequest {
    /// Completion status, `passed` or `failed`.
    pub status: String,
    /// Optional evidence payload.
    pub evidence: Option<Value>,
}

impl CompleteHookRequest {
    /// Creates a hook completion request.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            evidence: None,
        }
    }

    /// Sets the evidence payload.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// Request payload for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTasksRequest {
    /// Tenant partition; mandatory.
    pub scope: Option<String>,
    /// Optional queue restriction.
    pub queue: Option<String>,
    /// Optional priority restriction.
    pub priority: Option<String>,
    /// Page size, clamped to the configured maximum.
    pub limit: Option<i64>,
    /// Rows skipped before the first returned.
    pub offset: Option<i64>,
}

/// Response taxonomy category, one per status code class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid inputs.
    Validation,
    /// Unknown task or orchestrator, or no eligible claimable row.
    NotFound,
    /// Wrong state, expired lease, version mismatch, or lost race.
    Conflict,
    /// Unresolved `blocked_by` dependency.
    Dependency,
    /// Store failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code a transport shell should use.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict | Self::Dependency => 409,
            Self::Internal => 500,
        }
    }
}

/// Errors returned by the request facade.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// No scope was supplied and none could be resolved.
    #[error("missing required scope")]
    MissingScope,

    /// A numeric field carries a negative value.
    #[error("{field} must be non-negative")]
    NegativeField {
        /// Offending field name.
        field: &'static str,
    },

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The priority label is unknown.
    #[error(transparent)]
    Priority(#[from] ParsePriorityError),

    /// The hook status label is unknown.
    #[error(transparent)]
    HookStatus(#[from] ParseHookStatusError),

    /// The role is not registered.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// `done` cannot be assigned through a generic update; the terminal
    /// transition has mandatory side effects.
    #[error("queue 'done' cannot be assigned directly; accept the task instead")]
    ForbiddenDoneQueue,

    /// A task with the same key already exists.
    #[error("duplicate task key: {0}")]
    Duplicate(TaskKey),

    /// The task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskKey),

    /// The orchestrator has never registered.
    #[error("orchestrator {0} is not registered")]
    UnknownOrchestrator(OrchestratorId),

    /// No eligible task exists for the claim filter.
    #[error("No tasks available")]
    NoTask,

    /// A guard rejected the transition.
    #[error(transparent)]
    Rejected(#[from] TransitionError),

    /// A concurrent writer invalidated the observed snapshot.
    #[error("task {0} was modified concurrently")]
    Conflict(TaskKey),

    /// Store, registry, or directory failure.
    #[error("internal error: {0}")]
    Internal(Arc<dyn std::error::Error + Send + Sync>),
}

impl FacadeError {
    /// Returns the taxonomy category of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::MissingScope
            | Self::NegativeField { .. }
            | Self::Domain(_)
            | Self::Priority(_)
            | Self::HookStatus(_)
            | Self::UnknownRole(_)
            | Self::ForbiddenDoneQueue => ErrorKind::Validation,
            Self::NotFound(_) | Self::UnknownOrchestrator(_) | Self::NoTask => ErrorKind::NotFound,
            Self::Rejected(
                TransitionError::DependencyUnresolved { .. }
                | TransitionError::DependencyMissing { .. },
            ) => ErrorKind::Dependency,
            Self::Duplicate(_) | Self::Conflict(_) | Self::Rejected(_) => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<TaskStoreError> for FacadeError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::Duplicate(key) => Self::Duplicate(key),
            TaskStoreError::Persistence(inner) => Self::Internal(inner),
        }
    }
}

impl From<RegistryError> for FacadeError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Persistence(inner) => Self::Internal(inner),
        }
    }
}

impl From<DirectoryError> for FacadeError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Persistence(inner) => Self::Internal(inner),
        }
    }
}

impl From<EngineError> for FacadeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(key) => Self::NotFound(key),
            EngineError::Transition(inner) => Self::Rejected(inner),
            EngineError::Domain(inner) => Self::Domain(inner),
            EngineError::Conflict { task } => Self::Conflict(task),
            EngineError::Store(inner) => inner.into(),
        }
    }
}

impl From<ClaimError> for FacadeError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Engine(inner) => inner.into(),
            ClaimError::Registry(inner) => inner.into(),
            ClaimError::Store(inner) => inner.into(),
        }
    }
}

/// Result type for facade operations.
pub type FacadeResult<T> = Result<T, FacadeError>;

/// Request facade over the lifecycle engine, selector, and store.
#[derive(Clone)]
pub struct TaskFacade<S, D, R, C>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    R: RoleRegistry,
    C: Clock + Send + Sync,
{
    engine: TransitionEngine<S, C>,
    selector: ClaimSelector<S, R, C>,
    store: Arc<S>,
    directory: Arc<D>,
    roles: Arc<R>,
    clock: Arc<C>,
    config: CoordinatorConfig,
}

impl<S, D, R, C> TaskFacade<S, D, R, C>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    R: RoleRegistry,
    C: Clock + Send + Sync,
{
    /// Creates a facade wiring the engine and selector over shared ports.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        roles: Arc<R>,
        clock: Arc<C>,
        config: CoordinatorConfig,
    ) -> Self {
        let limits = BurnoutLimits {
            burnout_turn_threshold: config.burnout_turn_threshold,
            max_turn_limit: config.max_turn_limit,
        };
        let engine = TransitionEngine::new(Arc::clone(&store), Arc::clone(&clock), limits);
        let selector = ClaimSelector::new(
            Arc::clone(&store),
            Arc::clone(&roles),
            Arc::clone(&clock),
            engine.clone(),
            config.clone(),
        );
        Self {
            engine,
            selector,
            store,
            directory,
            roles,
            clock,
            config,
        }
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields, an unknown role
    /// (when any roles are registered), or a `done` initial queue, and a
    /// conflict for a duplicate key.
    pub async fn create_task(&self, request: CreateTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(request.id)?;
        let scope = ScopeName::new(request.scope)?;
        let queue = match request.queue {
            Some(label) => {
                let queue = Queue::new(label)?;
                if queue.is_done() {
                    return Err(FacadeError::ForbiddenDoneQueue);
                }
                queue
            }
            None => Queue::incoming(),
        };
        let priority = match request.priority.as_deref() {
            Some(label) => Priority::try_from(label)?,
            None => Priority::default(),
        };
        let role = normalize(request.role);
        if let Some(role) = &role {
            let any_registered = !self.roles.is_empty().await?;
            if any_registered && self.roles.find(role).await?.is_none() {
                return Err(FacadeError::UnknownRole(role.clone()));
            }
        }
        let blocked_by = normalize(request.blocked_by).map(TaskKey::new).transpose()?;

        let now = self.clock.utc();
        let task = Task::new(
            NewTaskSpec {
                key: key.clone(),
                scope,
                file_path: request.file_path,
                branch: request.branch,
                queue,
                priority,
                role,
                kind: normalize(request.kind),
                blocked_by,
                project_id: normalize(request.project_id),
                hooks: request.hooks.unwrap_or_default(),
                flow: normalize(request.flow),
                flow_overrides: request.flow_overrides,
                auto_accept: request.auto_accept.unwrap_or(false),
            },
            now,
        )?;
        self.store.insert(&task).await?;

        let entry = NewHistoryEntry::new(key, HistoryEvent::Created);
        if let Err(err) = self.store.append_history(&entry, now).await {
            tracing::warn!(task = %entry.task, error = %err, "failed to append created entry");
        }
        Ok(task)
    }

    /// Claims the most eligible task for the request.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NoTask`] when nothing is eligible,
    /// [`FacadeError::Conflict`] when a concurrent claimer won the
    /// selected row, and [`FacadeError::MissingScope`] when no scope
    /// could be resolved.
    pub async fn claim_task(&self, request: ClaimTaskRequest) -> FacadeResult<Task> {
        let orchestrator = OrchestratorId::new(request.orchestrator_id)?;
        let agent = AgentName::new(request.agent_name)?;
        let scope = self
            .resolve_scope(request.scope, Some(&orchestrator))
            .await?;
        let queue = request.queue.map(Queue::new).transpose()?;

        let outcome = self
            .selector
            .claim(ClaimRequest {
                scope,
                orchestrator,
                agent,
                role_filter: request.role_filter.and_then(LabelFilter::new),
                type_filter: request.type_filter.and_then(LabelFilter::new),
                queue,
                lease_duration_seconds: request.lease_duration_seconds,
            })
            .await?;
        match outcome {
            ClaimOutcome::Claimed(task) => Ok(task),
            ClaimOutcome::NoTask => Err(FacadeError::NoTask),
        }
    }

    /// Submits work for a claimed task.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the task is not claimed, the lease has
    /// expired, or the version does not match.
    pub async fn submit_task(&self, id: &str, request: SubmitTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        if request.commits_count < 0 {
            return Err(FacadeError::NegativeField {
                field: "commits_count",
            });
        }
        if request.turns_used < 0 {
            return Err(FacadeError::NegativeField {
                field: "turns_used",
            });
        }
        let transition = TransitionRequest::Submit(SubmitTransition {
            commits_count: request.commits_count,
            turns_used: request.turns_used,
            check_results: request.check_results,
            execution_notes: request.execution_notes,
            expected_version: request.expected_version,
        });
        Ok(self.engine.execute(&key, transition).await?)
    }

    /// Accepts a provisional submission; the only path to `done`.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the task is not provisional.
    pub async fn accept_task(&self, id: &str, request: AcceptTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        let accepted_by = require(request.accepted_by, "accepted_by")?;
        let transition = TransitionRequest::Accept(AcceptTransition { accepted_by });
        Ok(self.engine.execute(&key, transition).await?)
    }

    /// Rejects a provisional submission back to the pending pool.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the task is not provisional.
    pub async fn reject_task(&self, id: &str, request: RejectTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        let reason = require(request.reason, "reason")?;
        let rejected_by = require(request.rejected_by, "rejected_by")?;
        let transition = TransitionRequest::Reject(RejectTransition {
            reason,
            rejected_by,
        });
        Ok(self.engine.execute(&key, transition).await?)
    }

    /// Relinquishes a claim back to the pending pool.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the task is not claimed.
    pub async fn requeue_task(&self, id: &str, request: RequeueTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        let transition = TransitionRequest::Requeue(RequeueTransition {
            agent: normalize(request.agent),
            detail: normalize(request.detail),
        });
        Ok(self.engine.execute(&key, transition).await?)
    }

    /// Explicitly blocks a pending task on its dependency.
    ///
    /// # Errors
    ///
    /// Returns a conflict when the task is not `incoming` or carries no
    /// dependency.
    pub async fn block_task(&self, id: &str) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        Ok(self.engine.execute(&key, TransitionRequest::Block).await?)
    }

    /// Returns an explicitly blocked task to the pending pool.
    ///
    /// # Errors
    ///
    /// Returns a dependency error while the blocker is unresolved.
    pub async fn unblock_task(&self, id: &str) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        Ok(self.engine.execute(&key, TransitionRequest::Unblock).await?)
    }

    /// Applies a generic field update.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::ForbiddenDoneQueue`] when the update sets
    /// `queue = done`; the terminal transition must run through accept.
    pub async fn update_task(&self, id: &str, request: UpdateTaskRequest) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        let queue = request.queue.map(Queue::new).transpose()?;
        if queue.as_ref().is_some_and(Queue::is_done) {
            return Err(FacadeError::ForbiddenDoneQueue);
        }
        let priority = request
            .priority
            .as_deref()
            .map(Priority::try_from)
            .transpose()?;
        let blocked_by = match request.blocked_by {
            None => None,
            Some(None) => Some(None),
            Some(Some(blocker)) => {
                let blocker = TaskKey::new(blocker)?;
                if blocker == key {
                    return Err(FacadeError::Domain(TaskDomainError::SelfDependency(key)));
                }
                Some(Some(blocker))
            }
        };

        let patch = TaskPatch {
            queue,
            priority,
            role: request.role,
            kind: request.kind,
            blocked_by,
            pr_number: request.pr_number,
            flow: request.flow,
            flow_overrides: request.flow_overrides,
            auto_accept: request.auto_accept,
            execution_notes: request.execution_notes,
            hooks: request.hooks,
        };
        Ok(self.engine.update_fields(&key, &patch).await?)
    }

    /// Records the completion of a named hook.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown status label or hook
    /// name.
    pub async fn complete_hook(
        &self,
        id: &str,
        hook_name: &str,
        request: CompleteHookRequest,
    ) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        let status = HookStatus::try_from(request.status.as_str())?;
        Ok(self
            .engine
            .complete_hook(&key, hook_name, status, request.evidence)
            .await?)
    }

    /// Deletes a task, cascading its history.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] when the task does not exist.
    pub async fn delete_task(&self, id: &str) -> FacadeResult<()> {
        let key = TaskKey::new(id)?;
        let deleted = self.store.delete(&key).await?;
        if deleted {
            Ok(())
        } else {
            Err(FacadeError::NotFound(key))
        }
    }

    /// Retrieves a task by key.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] when the task does not exist.
    pub async fn get_task(&self, id: &str) -> FacadeResult<Task> {
        let key = TaskKey::new(id)?;
        self.store
            .find(&key)
            .await?
            .ok_or(FacadeError::NotFound(key))
    }

    /// Lists tasks within a scope, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::MissingScope`] when no scope is supplied.
    pub async fn list_tasks(&self, request: ListTasksRequest) -> FacadeResult<Vec<Task>> {
        let scope = self.resolve_scope(request.scope, None).await?;
        let mut filter = TaskFilter::for_scope(scope, self.config.clamp_page_size(request.limit));
        if let Some(queue) = request.queue {
            filter = filter.with_queue(Queue::new(queue)?);
        }
        if let Some(priority) = request.priority.as_deref() {
            filter = filter.with_priority(Priority::try_from(priority)?);
        }
        if let Some(offset) = request.offset {
            filter = filter.with_offset(offset.max(0));
        }
        Ok(self.store.list(&filter).await?)
    }

    /// Returns a task's history in append order.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] when the task does not exist.
    pub async fn task_history(&self, id: &str) -> FacadeResult<Vec<HistoryEntry>> {
        let key = TaskKey::new(id)?;
        if self.store.find(&key).await?.is_none() {
            return Err(FacadeError::NotFound(key));
        }
        Ok(self.store.history(&key).await?)
    }

    /// Resolves the effective scope: an explicit request scope wins,
    /// otherwise the named orchestrator's registered scope applies.
    async fn resolve_scope(
        &self,
        explicit: Option<String>,
        orchestrator: Option<&OrchestratorId>,
    ) -> FacadeResult<ScopeName> {
        if let Some(scope) = normalize(explicit) {
            return Ok(ScopeName::new(scope)?);
        }
        if let Some(id) = orchestrator {
            if let Some(registration) = self.directory.find(id).await? {
                return Ok(registration.scope().clone());
            }
        }
        Err(FacadeError::MissingScope)
    }
}

/// Trims an optional string, mapping blanks to `None`.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Requires a non-blank value for a named field.
fn require(value: String, field: &'static str) -> FacadeResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FacadeError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}
