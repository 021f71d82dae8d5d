//! The transition engine.
//!
//! Evaluates guards against an observed task snapshot, computes the
//! post-state in the domain, and commits it through the store's single
//! conditional write. Side effects (history rows, dependent unblocking)
//! run only after the write commits; their failures are logged and never
//! surface to the caller once the task state is durable.

use crate::task::{
    domain::{
        BurnoutLimits, DependencyState, Guard, HookStatus, SideEffect, Task, TaskDomainError,
        TaskKey, TaskPatch, TransitionError, TransitionRequest,
    },
    ports::{TaskStore, TaskStoreError, TransitionWrite},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by the transition engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskKey),

    /// A guard rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The conditional write matched zero rows: a concurrent writer got
    /// there first or the observed snapshot was already stale.
    #[error("task {task} was modified concurrently")]
    Conflict {
        /// Task whose write lost the race.
        task: TaskKey,
    },

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Applies lifecycle transitions with optimistic concurrency.
pub struct TransitionEngine<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    limits: BurnoutLimits,
}

impl<S, C> Clone for TransitionEngine<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            limits: self.limits,
        }
    }
}

impl<S, C> TransitionEngine<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a new engine.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, limits: BurnoutLimits) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    /// Returns the burnout limits the engine applies at submit time.
    #[must_use]
    pub const fn limits(&self) -> BurnoutLimits {
        self.limits
    }

    /// Loads a task and executes a transition on it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the task does not exist,
    /// [`EngineError::Transition`] when a guard rejects the request, and
    /// [`EngineError::Conflict`] when the conditional write matched zero
    /// rows.
    pub async fn execute(&self, key: &TaskKey, request: TransitionRequest) -> EngineResult<Task> {
        let observed = self
            .store
            .find(key)
            .await?
            .ok_or_else(|| EngineError::NotFound(key.clone()))?;
        self.execute_on(observed, request).await
    }

    /// Executes a transition on an already observed snapshot.
    ///
    /// The snapshot's `(queue, version)` pair becomes the write
    /// predicate, so a stale snapshot fails with
    /// [`EngineError::Conflict`] rather than clobbering concurrent work.
    ///
    /// # Errors
    ///
    /// As [`TransitionEngine::execute`], minus the lookup.
    pub async fn execute_on(
        &self,
        observed: Task,
        request: TransitionRequest,
    ) -> EngineResult<Task> {
        let now = self.clock.utc();
        let dependency = self.resolve_dependency(&observed, &request).await?;
        let ctx = request.guard_context(now, dependency);
        request.check(&observed, &ctx)?;

        let expected_queue = observed.queue().clone();
        let expected_version = observed.version();
        let mut next = observed;
        let effects = next.apply_transition(&request, now, &self.limits);

        let committed = self
            .store
            .commit(TransitionWrite {
                task: &next,
                expected_queue,
                expected_version,
            })
            .await?;
        if !committed {
            return Err(EngineError::Conflict {
                task: next.key().clone(),
            });
        }

        self.run_side_effects(effects).await;
        Ok(next)
    }

    /// Applies a generic field update under optimistic concurrency.
    ///
    /// An empty patch is a no-op returning the current state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] when the task does not exist and
    /// [`EngineError::Conflict`] when a concurrent writer invalidated the
    /// observed snapshot.
    pub async fn update_fields(&self, key: &TaskKey, patch: &TaskPatch) -> EngineResult<Task> {
        let observed = self
            .store
            .find(key)
            .await?
            .ok_or_else(|| EngineError::NotFound(key.clone()))?;
        if patch.is_empty() {
            return Ok(observed);
        }

        let now = self.clock.utc();
        let expected_queue = observed.queue().clone();
        let expected_version = observed.version();
        let mut next = observed;
        next.apply_patch(patch, now);

        let committed = self
            .store
            .commit(TransitionWrite {
                task: &next,
                expected_queue,
                expected_version,
            })
            .await?;
        if !committed {
            return Err(EngineError::Conflict {
                task: next.key().clone(),
            });
        }
        Ok(next)
    }

    /// Records the completion of a named hook under optimistic
    /// concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Domain`] when the task has no hook with the
    /// given name, plus the lookup and conflict errors of
    /// [`TransitionEngine::update_fields`].
    pub async fn complete_hook(
        &self,
        key: &TaskKey,
        name: &str,
        status: HookStatus,
        evidence: Option<serde_json::Value>,
    ) -> EngineResult<Task> {
        let observed = self
            .store
            .find(key)
            .await?
            .ok_or_else(|| EngineError::NotFound(key.clone()))?;

        let now = self.clock.utc();
        let expected_queue = observed.queue().clone();
        let expected_version = observed.version();
        let mut next = observed;
        next.complete_hook(name, status, evidence, now)?;

        let committed = self
            .store
            .commit(TransitionWrite {
                task: &next,
                expected_queue,
                expected_version,
            })
            .await?;
        if !committed {
            return Err(EngineError::Conflict {
                task: next.key().clone(),
            });
        }
        Ok(next)
    }

    /// Resolves the dependency state when the request's guards need it.
    async fn resolve_dependency(
        &self,
        task: &Task,
        request: &TransitionRequest,
    ) -> EngineResult<DependencyState> {
        let needs_dependency = request.guards().contains(&Guard::DependencyResolved);
        if !needs_dependency {
            return Ok(DependencyState::None);
        }
        let Some(blocker) = task.blocked_by() else {
            return Ok(DependencyState::None);
        };
        match self.store.find(blocker).await? {
            None => Ok(DependencyState::Missing(blocker.clone())),
            Some(dependency) if dependency.queue().is_done() => Ok(DependencyState::Resolved),
            Some(_) => Ok(DependencyState::Unresolved(blocker.clone())),
        }
    }

    /// Runs post-commit side effects, logging failures instead of
    /// propagating them: the authoritative task write is already durable.
    async fn run_side_effects(&self, effects: Vec<SideEffect>) {
        let now = self.clock.utc();
        for effect in effects {
            match effect {
                SideEffect::AppendHistory(entry) => {
                    if let Err(err) = self.store.append_history(&entry, now).await {
                        tracing::warn!(
                            task = %entry.task,
                            event = %entry.event,
                            error = %err,
                            "failed to append history entry",
                        );
                    }
                }
                SideEffect::UnblockDependents { blocker } => {
                    match self.store.clear_dependents(&blocker, now).await {
                        Ok(0) => {}
                        Ok(released) => {
                            tracing::info!(blocker = %blocker, released, "unblocked dependents");
                        }
                        Err(err) => {
                            tracing::warn!(
                                blocker = %blocker,
                                error = %err,
                                "failed to unblock dependents",
                            );
                        }
                    }
                }
            }
        }
    }
}
