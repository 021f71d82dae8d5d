//! Aggregate poll snapshots for orchestrators.
//!
//! One read-only round-trip hands an orchestrator everything it needs to
//! schedule: queue counts, a lightweight projection of provisional
//! tasks, its own registration state, and the registered flows.

use crate::config::CoordinatorConfig;
use crate::orchestrator::ports::{DirectoryError, OrchestratorDirectory};
use crate::registry::{
    domain::FlowDefinition,
    ports::{FlowRegistry, RegistryError},
};
use crate::task::{
    domain::{AgentName, HookSet, OrchestratorId, Queue, ScopeName, Task, TaskDomainError, TaskKey},
    ports::{TaskFilter, TaskStore, TaskStoreError},
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Queue counts for the three scheduling-relevant queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    /// Tasks waiting in the pending pool.
    pub incoming: i64,
    /// Tasks under an active claim.
    pub claimed: i64,
    /// Tasks awaiting review.
    pub provisional: i64,
}

/// Lightweight projection of a provisional task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionalTask {
    /// Task identity.
    pub id: TaskKey,
    /// Hook statuses.
    pub hooks: HookSet,
    /// Pull request number, when recorded.
    pub pr_number: Option<i64>,
    /// Agent that produced the submission.
    pub claimed_by: Option<AgentName>,
}

impl From<&Task> for ProvisionalTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.key().clone(),
            hooks: task.hooks().clone(),
            pr_number: task.pr_number(),
            claimed_by: task.claimed_by().cloned(),
        }
    }
}

/// Aggregate scheduling snapshot for one `(orchestrator, scope)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSnapshot {
    /// Queue counts within the scope.
    pub queue_counts: QueueCounts,
    /// Provisional tasks awaiting review within the scope.
    pub provisional: Vec<ProvisionalTask>,
    /// Whether the polling orchestrator is registered.
    pub orchestrator_registered: bool,
    /// Scope the snapshot was taken in.
    pub scope: ScopeName,
    /// Registered flows.
    pub flows: Vec<FlowDefinition>,
}

/// Errors returned by poll requests.
#[derive(Debug, Error)]
pub enum PollError {
    /// No scope was supplied and none could be resolved.
    #[error("missing required scope")]
    MissingScope,

    /// Identity validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// Directory operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Flow registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Builds aggregate poll snapshots.
#[derive(Clone)]
pub struct SchedulerPollService<S, D, F>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    F: FlowRegistry,
{
    store: Arc<S>,
    directory: Arc<D>,
    flows: Arc<F>,
    config: CoordinatorConfig,
}

impl<S, D, F> SchedulerPollService<S, D, F>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    F: FlowRegistry,
{
    /// Creates a new poll service.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        directory: Arc<D>,
        flows: Arc<F>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            directory,
            flows,
            config,
        }
    }

    /// Builds the snapshot for an orchestrator.
    ///
    /// The explicit scope wins; otherwise the orchestrator's registered
    /// scope applies.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::MissingScope`] when no scope could be
    /// resolved.
    pub async fn poll(
        &self,
        orchestrator_id: &str,
        scope: Option<String>,
    ) -> Result<PollSnapshot, PollError> {
        let orchestrator = OrchestratorId::new(orchestrator_id)?;
        let registration = self.directory.find(&orchestrator).await?;

        let scope = match scope.map(ScopeName::new).transpose()? {
            Some(explicit) => explicit,
            None => registration
                .as_ref()
                .map(|registration| registration.scope().clone())
                .ok_or(PollError::MissingScope)?,
        };

        let queue_counts = QueueCounts {
            incoming: self
                .store
                .count_in_queue(&scope, &Queue::incoming())
                .await?,
            claimed: self.store.count_in_queue(&scope, &Queue::claimed()).await?,
            provisional: self
                .store
                .count_in_queue(&scope, &Queue::provisional())
                .await?,
        };

        let provisional_filter =
            TaskFilter::for_scope(scope.clone(), self.config.default_page_size)
                .with_queue(Queue::provisional());
        let provisional = self
            .store
            .list(&provisional_filter)
            .await?
            .iter()
            .map(ProvisionalTask::from)
            .collect();

        Ok(PollSnapshot {
            queue_counts,
            provisional,
            orchestrator_registered: registration.is_some(),
            scope,
            flows: self.flows.list().await?,
        })
    }
}
