//! The claim selector.
//!
//! Picks at most one eligible task under the deterministic priority
//! order and hands it to the engine's claim transition with the observed
//! version. Because the engine predicate includes that version, at most
//! one concurrent selector across the fleet wins; losers surface a
//! conflict and may retry or report no task.

use super::engine::{EngineError, TransitionEngine};
use crate::config::CoordinatorConfig;
use crate::registry::ports::{RegistryError, RoleRegistry};
use crate::task::{
    domain::{
        AgentName, ClaimTransition, LabelFilter, OrchestratorId, Queue, ScopeName, Task,
        TransitionRequest,
    },
    ports::{ClaimCriteria, TaskStore, TaskStoreError},
};
use chrono::Duration;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Validated claim inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    /// Tenant partition the claim is made under.
    pub scope: ScopeName,
    /// Fleet member taking the lease.
    pub orchestrator: OrchestratorId,
    /// Agent taking the lease.
    pub agent: AgentName,
    /// Optional role filter, single label or set.
    pub role_filter: Option<LabelFilter>,
    /// Optional type filter, single label or set.
    pub type_filter: Option<LabelFilter>,
    /// Optional queue override.
    pub queue: Option<Queue>,
    /// Optional lease length in seconds, clamped to the configured
    /// maximum.
    pub lease_duration_seconds: Option<u64>,
}

/// Outcome of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A task was claimed; the lease is recorded on it.
    Claimed(Task),
    /// No eligible task exists. Not an error.
    NoTask,
}

/// Errors returned by claim attempts.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The engine rejected the claim; a conflict here means a concurrent
    /// selector won the row.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Role registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Selects and claims eligible tasks for orchestrators.
#[derive(Clone)]
pub struct ClaimSelector<S, R, C>
where
    S: TaskStore,
    R: RoleRegistry,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    roles: Arc<R>,
    clock: Arc<C>,
    engine: TransitionEngine<S, C>,
    config: CoordinatorConfig,
}

impl<S, R, C> ClaimSelector<S, R, C>
where
    S: TaskStore,
    R: RoleRegistry,
    C: Clock + Send + Sync,
{
    /// Creates a new selector sharing the engine's store and clock.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        roles: Arc<R>,
        clock: Arc<C>,
        engine: TransitionEngine<S, C>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            roles,
            clock,
            engine,
            config,
        }
    }

    /// Attempts to claim the most eligible task for the request.
    ///
    /// Eligible rows are ordered by priority (P0 first) then creation
    /// time (oldest first); exactly one row is attempted. Claims taken
    /// from `provisional` stay there as review claims.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::Engine`] with a conflict when a concurrent
    /// claimer won the selected row, or the underlying registry/store
    /// failure.
    pub async fn claim(&self, request: ClaimRequest) -> Result<ClaimOutcome, ClaimError> {
        let queue = self.resolve_queue(&request).await?;
        let criteria = ClaimCriteria {
            scope: request.scope.clone(),
            queue: queue.clone(),
            roles: request.role_filter.clone(),
            kinds: request.type_filter.clone(),
        };

        let Some(candidate) = self.store.next_claimable(&criteria).await? else {
            return Ok(ClaimOutcome::NoTask);
        };

        let now = self.clock.utc();
        let lease = self
            .config
            .clamp_lease_duration(request.lease_duration_seconds);
        let lease_seconds = i64::try_from(lease.as_secs()).unwrap_or(i64::MAX);
        let claim = ClaimTransition {
            agent: request.agent,
            orchestrator: request.orchestrator,
            lease_expires_at: now + Duration::seconds(lease_seconds),
            scope: request.scope,
            role_filter: request.role_filter,
            from: queue.clone(),
            expected_version: candidate.version(),
        };
        let transition = if queue.is_provisional() {
            TransitionRequest::ClaimForReview(claim)
        } else {
            TransitionRequest::Claim(claim)
        };

        let task = self.engine.execute_on(candidate, transition).await?;
        Ok(ClaimOutcome::Claimed(task))
    }

    /// Resolves the queue to claim from.
    ///
    /// An explicit request queue wins; otherwise a single-role filter may
    /// carry a registered `claims_from` hint; otherwise `incoming`.
    async fn resolve_queue(&self, request: &ClaimRequest) -> Result<Queue, ClaimError> {
        if let Some(queue) = &request.queue {
            return Ok(queue.clone());
        }
        if let Some(role) = request.role_filter.as_ref().and_then(LabelFilter::single) {
            if let Some(definition) = self.roles.find(role).await? {
                if let Some(queue) = definition.claims_from() {
                    return Ok(queue.clone());
                }
            }
        }
        Ok(Queue::incoming())
    }
}
