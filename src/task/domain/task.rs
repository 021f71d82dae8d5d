//! Task aggregate root.
//!
//! The aggregate is mutated exclusively through
//! [`Task::apply_transition`] (driven by the transition engine) and
//! [`Task::apply_patch`] (generic field updates). Every mutation bumps
//! the optimistic-concurrency `version` counter by exactly one; the
//! store's conditional write predicates on the pre-mutation value.

use super::history::{HistoryEvent, NewHistoryEntry};
use super::transition::{BurnoutLimits, ClaimTransition, SideEffect, TransitionRequest};
use super::{
    AgentName, HookSet, HookStatus, OrchestratorId, Priority, Queue, ScopeName, TaskDomainError,
    TaskKey,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Parameter object for creating a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskSpec {
    /// Caller-supplied identity.
    pub key: TaskKey,
    /// Tenant partition the task belongs to.
    pub scope: ScopeName,
    /// Primary file the task concerns; opaque to the engine.
    pub file_path: String,
    /// Branch the task targets; opaque to the engine.
    pub branch: String,
    /// Initial queue, usually `incoming`.
    pub queue: Queue,
    /// Priority class.
    pub priority: Priority,
    /// Optional role classifier used by selector filters.
    pub role: Option<String>,
    /// Optional type classifier used by selector filters.
    pub kind: Option<String>,
    /// Optional dependency that must reach `done` before claims.
    pub blocked_by: Option<TaskKey>,
    /// Optional owning project.
    pub project_id: Option<String>,
    /// Named sub-gates attached at creation.
    pub hooks: HookSet,
    /// Declarative pipeline label.
    pub flow: Option<String>,
    /// Per-task flow overrides, opaque to the engine.
    pub flow_overrides: Option<Value>,
    /// Whether review may be skipped by outer tooling.
    pub auto_accept: bool,
}

/// Generic field update applied outside the transition engine.
///
/// Every field is optional; present fields are written, absent fields
/// are left untouched. Nullable columns use a nested `Option` so callers
/// can distinguish "leave" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement queue label. The facade rejects `done` here; the
    /// terminal transition must run through accept.
    pub queue: Option<Queue>,
    /// Replacement priority.
    pub priority: Option<Priority>,
    /// Replacement role classifier.
    pub role: Option<Option<String>>,
    /// Replacement type classifier.
    pub kind: Option<Option<String>>,
    /// Replacement dependency.
    pub blocked_by: Option<Option<TaskKey>>,
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

impl TaskPatch {
    /// Returns `true` when the patch carries no field updates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identity.
    pub key: TaskKey,
    /// Persisted queue label.
    pub queue: Queue,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted role classifier.
    pub role: Option<String>,
    /// Persisted type classifier.
    pub kind: Option<String>,
    /// Persisted scope.
    pub scope: ScopeName,
    /// Persisted file path.
    pub file_path: String,
    /// Persisted branch.
    pub branch: String,
    /// Persisted owning project.
    pub project_id: Option<String>,
    /// Persisted dependency.
    pub blocked_by: Option<TaskKey>,
    /// Persisted claim holder name.
    pub claimed_by: Option<AgentName>,
    /// Persisted claim timestamp.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Persisted claim holder fleet identity.
    pub orchestrator_id: Option<OrchestratorId>,
    /// Persisted lease expiry.
    pub lease_expires_at: Option<DateTime<Utc>>,
    /// Persisted optimistic-concurrency counter.
    pub version: i64,
    /// Persisted submission commit count.
    pub commits_count: Option<i64>,
    /// Persisted submission turn count.
    pub turns_used: Option<i64>,
    /// Persisted submission check results.
    pub check_results: Option<Value>,
    /// Persisted submission notes.
    pub execution_notes: Option<String>,
    /// Persisted rejection tally.
    pub rejection_count: i64,
    /// Persisted submission timestamp.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted pull request number.
    pub pr_number: Option<i64>,
    /// Persisted hook set.
    pub hooks: HookSet,
    /// Persisted flow label.
    pub flow: Option<String>,
    /// Persisted flow overrides.
    pub flow_overrides: Option<Value>,
    /// Persisted auto-accept marker.
    pub auto_accept: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    key: TaskKey,
    queue: Queue,
    priority: Priority,
    role: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    scope: ScopeName,
    file_path: String,
    branch: String,
    project_id: Option<String>,
    blocked_by: Option<TaskKey>,
    claimed_by: Option<AgentName>,
    claimed_at: Option<DateTime<Utc>>,
    orchestrator_id: Option<OrchestratorId>,
    lease_expires_at: Option<DateTime<Utc>>,
    version: i64,
    commits_count: Option<i64>,
    turns_used: Option<i64>,
    check_results: Option<Value>,
    execution_notes: Option<String>,
    rejection_count: i64,
    submitted_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    pr_number: Option<i64>,
    hooks: HookSet,
    flow: Option<String>,
    flow_overrides: Option<Value>,
    auto_accept: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new unclaimed task at version 1.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the file path or branch is empty
    /// or the task is declared blocked by itself.
    pub fn new(spec: NewTaskSpec, now: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        if spec.file_path.trim().is_empty() {
            return Err(TaskDomainError::EmptyFilePath);
        }
        if spec.branch.trim().is_empty() {
            return Err(TaskDomainError::EmptyBranch);
        }
        if spec.blocked_by.as_ref() == Some(&spec.key) {
            return Err(TaskDomainError::SelfDependency(spec.key));
        }

        Ok(Self {
            key: spec.key,
            queue: spec.queue,
            priority: spec.priority,
            role: spec.role,
            kind: spec.kind,
            scope: spec.scope,
            file_path: spec.file_path,
            branch: spec.branch,
            project_id: spec.project_id,
            blocked_by: spec.blocked_by,
            claimed_by: None,
            claimed_at: None,
            orchestrator_id: None,
            lease_expires_at: None,
            version: 1,
            commits_count: None,
            turns_used: None,
            check_results: None,
            execution_notes: None,
            rejection_count: 0,
            submitted_at: None,
            completed_at: None,
            pr_number: None,
            hooks: spec.hooks,
            flow: spec.flow,
            flow_overrides: spec.flow_overrides,
            auto_accept: spec.auto_accept,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            key: data.key,
            queue: data.queue,
            priority: data.priority,
            role: data.role,
            kind: data.kind,
            scope: data.scope,
            file_path: data.file_path,
            branch: data.branch,
            project_id: data.project_id,
            blocked_by: data.blocked_by,
            claimed_by: data.claimed_by,
            claimed_at: data.claimed_at,
            orchestrator_id: data.orchestrator_id,
            lease_expires_at: data.lease_expires_at,
            version: data.version,
            commits_count: data.commits_count,
            turns_used: data.turns_used,
            check_results: data.check_results,
            execution_notes: data.execution_notes,
            rejection_count: data.rejection_count,
            submitted_at: data.submitted_at,
            completed_at: data.completed_at,
            pr_number: data.pr_number,
            hooks: data.hooks,
            flow: data.flow,
            flow_overrides: data.flow_overrides,
            auto_accept: data.auto_accept,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identity.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Returns the current queue label.
    #[must_use]
    pub const fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Returns the priority class.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the role classifier.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Returns the type classifier.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns the tenant partition.
    #[must_use]
    pub const fn scope(&self) -> &ScopeName {
        &self.scope
    }

    /// Returns the file path.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Returns the branch.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the owning project.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Returns the dependency that must resolve before claims.
    #[must_use]
    pub const fn blocked_by(&self) -> Option<&TaskKey> {
        self.blocked_by.as_ref()
    }

    /// Returns the agent holding the current claim.
    #[must_use]
    pub const fn claimed_by(&self) -> Option<&AgentName> {
        self.claimed_by.as_ref()
    }

    /// Returns the claim timestamp.
    #[must_use]
    pub const fn claimed_at(&self) -> Option<DateTime<Utc>> {
        self.claimed_at
    }

    /// Returns the fleet identity holding the current claim.
    #[must_use]
    pub const fn orchestrator_id(&self) -> Option<&OrchestratorId> {
        self.orchestrator_id.as_ref()
    }

    /// Returns the absolute lease expiry.
    #[must_use]
    pub const fn lease_expires_at(&self) -> Option<DateTime<Utc>> {
        self.lease_expires_at
    }

    /// Returns the optimistic-concurrency counter.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// Returns the submitted commit count.
    #[must_use]
    pub const fn commits_count(&self) -> Option<i64> {
        self.commits_count
    }

    /// Returns the submitted turn count.
    #[must_use]
    pub const fn turns_used(&self) -> Option<i64> {
        self.turns_used
    }

    /// Returns the submitted check results.
    #[must_use]
    pub const fn check_results(&self) -> Option<&Value> {
        self.check_results.as_ref()
    }

    /// Returns the submitted execution notes.
    #[must_use]
    pub fn execution_notes(&self) -> Option<&str> {
        self.execution_notes.as_deref()
    }

    /// Returns the cumulative rejection tally.
    #[must_use]
    pub const fn rejection_count(&self) -> i64 {
        self.rejection_count
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Returns the completion timestamp, set only via accept.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the pull request number.
    #[must_use]
    pub const fn pr_number(&self) -> Option<i64> {
        self.pr_number
    }

    /// Returns the hook set.
    #[must_use]
    pub const fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    /// Returns the flow label.
    #[must_use]
    pub fn flow(&self) -> Option<&str> {
        self.flow.as_deref()
    }

    /// Returns the flow overrides payload.
    #[must_use]
    pub const fn flow_overrides(&self) -> Option<&Value> {
        self.flow_overrides.as_ref()
    }

    /// Returns the auto-accept marker.
    #[must_use]
    pub const fn auto_accept(&self) -> bool {
        self.auto_accept
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the lease is granted and unexpired at `now`.
    #[must_use]
    pub fn lease_active_at(&self, now: DateTime<Utc>) -> bool {
        self.lease_expires_at.is_some_and(|expiry| expiry > now)
    }

    /// Applies a checked transition, mutating the aggregate in place and
    /// returning the side effects to run after the store write commits.
    ///
    /// Guards must already have been evaluated via
    /// [`TransitionRequest::check`]; this method only records the
    /// post-state. The version counter is bumped by exactly one.
    #[must_use]
    pub fn apply_transition(
        &mut self,
        request: &TransitionRequest,
        now: DateTime<Utc>,
        limits: &BurnoutLimits,
    ) -> Vec<SideEffect> {
        self.version += 1;
        self.updated_at = now;

        match request {
            TransitionRequest::Claim(claim) => {
                self.queue = Queue::claimed();
                self.grant_lease(claim, now);
                vec![SideEffect::AppendHistory(
                    NewHistoryEntry::new(self.key.clone(), HistoryEvent::Claimed)
                        .with_agent(claim.agent.as_str())
                        .with_details(json!({
                            "orchestrator_id": claim.orchestrator.as_str(),
                            "lease_expires_at": claim.lease_expires_at,
                        })),
                )]
            }
            TransitionRequest::ClaimForReview(claim) => {
                // Review claims stay in provisional; only the lease moves.
                self.grant_lease(claim, now);
                vec![SideEffect::AppendHistory(
                    NewHistoryEntry::new(self.key.clone(), HistoryEvent::ReviewClaimed)
                        .with_agent(claim.agent.as_str())
                        .with_details(json!({
                            "orchestrator_id": claim.orchestrator.as_str(),
                            "lease_expires_at": claim.lease_expires_at,
                        })),
                )]
            }
            TransitionRequest::Submit(submit) => {
                let burnout = limits.is_burnout(submit.commits_count, submit.turns_used);
                self.queue = if burnout {
                    Queue::needs_continuation()
                } else {
                    Queue::provisional()
                };
                self.commits_count = Some(submit.commits_count);
                self.turns_used = Some(submit.turns_used);
                self.check_results = submit.check_results.clone();
                self.execution_notes = submit.execution_notes.clone();
                self.submitted_at = Some(now);
                // The lease is consumed by submission; holder identity is
                // kept as provenance for the review projection.
                self.lease_expires_at = None;

                let agent = self.claimed_by.as_ref().map(AgentName::as_str);
                let mut effects = vec![SideEffect::AppendHistory({
                    let entry = NewHistoryEntry::new(self.key.clone(), HistoryEvent::Submitted)
                        .with_details(json!({
                            "commits_count": submit.commits_count,
                            "turns_used": submit.turns_used,
                        }));
                    match agent {
                        Some(agent) => entry.with_agent(agent),
                        None => entry,
                    }
                })];
                if burnout {
                    effects.push(SideEffect::AppendHistory(
                        NewHistoryEntry::new(self.key.clone(), HistoryEvent::BurnoutDetected)
                            .with_details(json!({
                                "turns_used": submit.turns_used,
                                "threshold": limits.threshold_for(
                                    submit.commits_count,
                                    submit.turns_used,
                                ),
                            })),
                    ));
                }
                effects
            }
            TransitionRequest::Accept(accept) => {
                self.queue = Queue::done();
                self.completed_at = Some(now);
                self.lease_expires_at = None;
                vec![
                    SideEffect::AppendHistory(
                        NewHistoryEntry::new(self.key.clone(), HistoryEvent::Accepted)
                            .with_agent(accept.accepted_by.clone()),
                    ),
                    SideEffect::UnblockDependents {
                        blocker: self.key.clone(),
                    },
                ]
            }
            TransitionRequest::Reject(reject) => {
                self.queue = Queue::incoming();
                self.rejection_count += 1;
                self.clear_lease();
                vec![SideEffect::AppendHistory(
                    NewHistoryEntry::new(self.key.clone(), HistoryEvent::Rejected)
                        .with_agent(reject.rejected_by.clone())
                        .with_details(json!({ "reason": reject.reason })),
                )]
            }
            TransitionRequest::Requeue(requeue) => {
                self.queue = Queue::incoming();
                self.clear_lease();
                vec![SideEffect::AppendHistory({
                    let entry = NewHistoryEntry::new(self.key.clone(), HistoryEvent::Requeued);
                    let entry = match requeue.agent.as_deref() {
                        Some(agent) => entry.with_agent(agent),
                        None => entry,
                    };
                    match requeue.detail.as_deref() {
                        Some(detail) => entry.with_details(json!({ "detail": detail })),
                        None => entry,
                    }
                })]
            }
            TransitionRequest::Block => {
                self.queue = Queue::blocked();
                vec![SideEffect::AppendHistory(NewHistoryEntry::new(
                    self.key.clone(),
                    HistoryEvent::Blocked,
                ))]
            }
            TransitionRequest::Unblock => {
                self.queue = Queue::incoming();
                self.blocked_by = None;
                vec![SideEffect::AppendHistory(NewHistoryEntry::new(
                    self.key.clone(),
                    HistoryEvent::Unblocked,
                ))]
            }
        }
    }

    /// Applies a generic field update, bumping the version when any field
    /// is present.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        if patch.is_empty() {
            return;
        }
        self.version += 1;
        self.updated_at = now;

        if let Some(queue) = &patch.queue {
            self.queue = queue.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
        if let Some(kind) = &patch.kind {
            self.kind = kind.clone();
        }
        if let Some(blocked_by) = &patch.blocked_by {
            self.blocked_by = blocked_by.clone();
        }
        if let Some(pr_number) = patch.pr_number {
            self.pr_number = pr_number;
        }
        if let Some(flow) = &patch.flow {
            self.flow = flow.clone();
        }
        if let Some(flow_overrides) = &patch.flow_overrides {
            self.flow_overrides = flow_overrides.clone();
        }
        if let Some(auto_accept) = patch.auto_accept {
            self.auto_accept = auto_accept;
        }
        if let Some(execution_notes) = &patch.execution_notes {
            self.execution_notes = execution_notes.clone();
        }
        if let Some(hooks) = &patch.hooks {
            self.hooks = hooks.clone();
        }
    }

    /// Records the completion of a named hook, bumping the version.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownHook`] when the task has no hook
    /// with the given name.
    pub fn complete_hook(
        &mut self,
        name: &str,
        status: HookStatus,
        evidence: Option<Value>,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        self.hooks.complete(name, status, evidence)?;
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Releases an expired lease back to the pending pool.
    ///
    /// Deliberately does **not** bump the version: a stale submit from
    /// the previous holder still collides on `queue = claimed` and fails
    /// cleanly, so correctness does not require it.
    pub fn release_expired_lease(&mut self, now: DateTime<Utc>) {
        self.queue = Queue::incoming();
        self.clear_lease();
        self.updated_at = now;
    }

    /// Clears the dependency after its blocker reached the terminal
    /// state.
    pub fn dependency_resolved(&mut self, now: DateTime<Utc>) {
        self.blocked_by = None;
        self.version += 1;
        self.updated_at = now;
    }

    fn grant_lease(&mut self, claim: &ClaimTransition, now: DateTime<Utc>) {
        self.claimed_by = Some(claim.agent.clone());
        self.claimed_at = Some(now);
        self.orchestrator_id = Some(claim.orchestrator.clone());
        self.lease_expires_at = Some(claim.lease_expires_at);
    }

    fn clear_lease(&mut self) {
        self.claimed_by = None;
        self.claimed_at = None;
        self.orchestrator_id = None;
        self.lease_expires_at = None;
    }
}
